// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history retrieval.
//!
//! Pulls recent messages for a conversation and reduces them to ordered
//! [`ConversationTurn`]s. History is best-effort context: every failure mode
//! returns an empty transcript so a reply still goes out.

use serde::Deserialize;
use tracing::{debug, warn};

use larkrelay_core::{ConversationId, ConversationTurn, Role};

use crate::client::PlatformClient;

/// Platform error codes meaning the app lacks message-read permission.
const PERMISSION_CODES: [i64; 3] = [99991663, 99991401, 99991400];

/// The platform caps message listing at 50 per page.
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl PlatformClient {
    /// Fetch up to `limit` recent messages as conversation turns.
    ///
    /// Returns an empty transcript on any failure, including the
    /// permission-denied codes a bot without message-read scope gets.
    pub async fn fetch_history(
        &self,
        conversation: &ConversationId,
        limit: u32,
    ) -> Vec<ConversationTurn> {
        let token = match self.app.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "no app token; proceeding without history");
                return Vec::new();
            }
        };

        let url = format!("{}/im/v1/messages", self.base_url);
        let page_size = limit.min(MAX_PAGE_SIZE).to_string();

        let response = match self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("container_id_type", "chat"),
                ("container_id", conversation.0.as_str()),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "history request failed; proceeding without history");
                return Vec::new();
            }
        };

        let status = response.status();
        debug!(status = %status, conversation = %conversation.0, "history response received");

        let envelope: HistoryEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "unreadable history response; proceeding without history");
                return Vec::new();
            }
        };

        if envelope.code != 0 {
            if PERMISSION_CODES.contains(&envelope.code) {
                warn!(
                    code = envelope.code,
                    "missing message-read permission; proceeding without history"
                );
            } else {
                warn!(code = envelope.code, msg = %envelope.msg, "history request rejected");
            }
            return Vec::new();
        }

        let items = envelope.data.map(|data| data.items).unwrap_or_default();
        let app_id = self.app.app_id();
        let turns: Vec<ConversationTurn> = items
            .iter()
            .filter_map(|item| parse_turn(item, app_id))
            .collect();

        debug!(
            raw = items.len(),
            parsed = turns.len(),
            "conversation history fetched"
        );
        turns
    }
}

/// Reduce one raw message to a turn, or skip it.
///
/// Only plain text messages survive. The sender decides the role: open ids
/// with the app prefix (or matching the app id itself) are the relay's own
/// replies, everything else is a user.
fn parse_turn(item: &serde_json::Value, app_id: &str) -> Option<ConversationTurn> {
    if item.get("msg_type").and_then(|v| v.as_str()) != Some("text") {
        return None;
    }

    let open_id = item
        .get("sender")
        .and_then(coerce_object)
        .and_then(|sender| sender.get("id").and_then(coerce_object))
        .and_then(|id| {
            id.get("open_id")
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| "unknown".to_string());

    let body = coerce_object(item.get("body")?)?;
    let content = match body.get("content")? {
        serde_json::Value::String(raw) => serde_json::from_str::<serde_json::Value>(raw).ok()?,
        other => other.clone(),
    };
    let text = content.get("text")?.as_str()?;
    if text.is_empty() {
        return None;
    }

    let role = if open_id.starts_with("cli_") || open_id == app_id {
        Role::Assistant
    } else {
        Role::User
    };

    Some(ConversationTurn {
        role,
        content: text.to_string(),
    })
}

/// Nested objects sometimes arrive double-encoded as JSON strings.
fn coerce_object(value: &serde_json::Value) -> Option<serde_json::Value> {
    match value {
        serde_json::Value::String(raw) => serde_json::from_str(raw).ok(),
        other => Some(other.clone()),
    }
}
