// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply delivery.
//!
//! Sends one text message per reply. The platform wants the message payload
//! double-encoded: `content` is a JSON string holding `{"text": ...}`.
//! Delivery is single-shot; failures are logged and reported as `false`.

use serde::Deserialize;
use tracing::{debug, warn};

use larkrelay_core::{ConversationId, MessageId};

use crate::client::PlatformClient;

#[derive(Debug, Deserialize)]
struct SendResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl PlatformClient {
    /// Deliver `text` to a conversation, threading onto the triggering
    /// message when `in_reply_to` is given.
    pub async fn send_reply(
        &self,
        conversation: &ConversationId,
        text: &str,
        in_reply_to: Option<&MessageId>,
    ) -> bool {
        let token = match self.app.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "no app token; reply not sent");
                return false;
            }
        };

        let url = format!("{}/im/v1/messages", self.base_url);
        let content = serde_json::json!({ "text": text }).to_string();
        let mut body = serde_json::json!({
            "receive_id": conversation.0,
            "msg_type": "text",
            "content": content,
        });
        if let Some(message_id) = in_reply_to {
            body["uuid"] = serde_json::Value::String(message_id.0.clone());
        }

        let response = match self
            .http
            .post(&url)
            .query(&[("receive_id_type", "chat_id")])
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "reply delivery failed");
                return false;
            }
        };

        let status = response.status();
        debug!(status = %status, conversation = %conversation.0, "send response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "platform refused reply");
            return false;
        }

        match response.json::<SendResponse>().await {
            Ok(parsed) if parsed.code == 0 => true,
            Ok(parsed) => {
                warn!(code = parsed.code, msg = %parsed.msg, "platform rejected reply");
                false
            }
            Err(e) => {
                warn!(error = %e, "unreadable send response");
                false
            }
        }
    }
}
