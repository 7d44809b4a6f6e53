// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP reply backend.
//!
//! Posts the reply request to a configured endpoint and accepts the reply
//! under any of the field names backends have used (`reply`, `response`,
//! `answer`). Anything else is a failure the router cascades past.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use larkrelay_config::BackendConfig;
use larkrelay_core::{RelayError, ReplyBackend, ReplyRequest};

pub struct HttpBackend {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, RelayError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout,
            http,
        })
    }
}

#[async_trait]
impl ReplyBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn invoke(&self, request: &ReplyRequest) -> Result<String, RelayError> {
        let payload = serde_json::json!({
            "message": request.message,
            "user_id": request.sender_id,
            "chat_id": request.conversation_id,
            "history": request.history,
            "context": {
                "platform": "lark",
                "source": "larkrelay"
            }
        });

        let mut req = self.http.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req.send().await.map_err(|e| RelayError::Backend {
            message: format!("request to '{}' failed: {e}", self.name),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(backend = %self.name, status = %status, "backend response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Backend {
                message: format!("backend '{}' returned {status}: {body}", self.name),
                source: None,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| RelayError::Backend {
            message: format!("backend '{}' sent an unreadable response: {e}", self.name),
            source: Some(Box::new(e)),
        })?;

        reply_text(&body).ok_or_else(|| RelayError::Backend {
            message: format!("backend '{}' response carried no reply text", self.name),
            source: None,
        })
    }
}

fn reply_text(body: &serde_json::Value) -> Option<String> {
    ["reply", "response", "answer"].iter().find_map(|key| {
        body.get(*key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    })
}
