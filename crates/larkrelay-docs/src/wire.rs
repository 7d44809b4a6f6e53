// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared drive search request plumbing.
//!
//! The online strategies differ only in which credential they present; the
//! endpoint, request body, and response shape are identical.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use larkrelay_core::RelayError;

use crate::format::{DocHit, parse_hits};

/// Document searches tolerate more latency than message calls.
pub(crate) const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: serde_json::Value,
}

pub(crate) async fn search_drive_files(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    query: &str,
    count: u32,
) -> Result<Vec<DocHit>, RelayError> {
    let url = format!("{base_url}/drive/v1/files/search");
    let body = serde_json::json!({
        "search_key": query,
        "count": count,
        "offset": 0,
    });

    let response = http
        .post(&url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .map_err(|e| RelayError::Docs {
            message: format!("search request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

    let status = response.status();
    debug!(status = %status, query = %query, "search response received");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RelayError::Docs {
            message: format!("search endpoint returned {status}: {body}"),
            source: None,
        });
    }

    let envelope: SearchEnvelope = response.json().await.map_err(|e| RelayError::Docs {
        message: format!("failed to parse search response: {e}"),
        source: Some(Box::new(e)),
    })?;

    if envelope.code != 0 {
        return Err(RelayError::Docs {
            message: format!("search rejected (code {}): {}", envelope.code, envelope.msg),
            source: None,
        });
    }

    Ok(parse_hits(&envelope.data))
}
