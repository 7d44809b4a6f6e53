// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! App access token cache.
//!
//! The app token authenticates tenant-level platform calls (message send,
//! history fetch, tenant document search). It is short-lived, cheap to
//! re-issue, and held only in memory.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use larkrelay_core::RelayError;

/// Tokens are considered expired this many seconds before the platform's
/// own deadline, so a token returned from the cache is never mid-expiry.
const SAFETY_MARGIN_SECS: u64 = 300;

/// Lifetime assumed when the platform omits `expire` from its response.
const DEFAULT_TTL_SECS: u64 = 7200;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Caches the tenant app access token, re-issuing it only on cache miss
/// or expiry.
///
/// The cache lock is held across the exchange so concurrent callers after
/// an expiry share a single re-issue.
pub struct AppTokenCache {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct AppTokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    app_access_token: Option<String>,
    #[serde(default)]
    expire: Option<u64>,
}

impl AppTokenCache {
    pub fn new(
        base_url: String,
        app_id: String,
        app_secret: String,
    ) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RelayError::Auth {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url,
            app_id,
            app_secret,
            cached: tokio::sync::Mutex::new(None),
        })
    }

    /// The configured application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Whether app credentials are present at all.
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.is_empty()
    }

    /// Returns a valid app access token, exchanging credentials if the
    /// cached one is absent or expired.
    pub async fn get(&self) -> Result<String, RelayError> {
        if !self.is_configured() {
            return Err(RelayError::Auth {
                message: "app credentials are not configured".to_string(),
                source: None,
            });
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.expires_at
        {
            debug!("app token served from cache");
            return Ok(token.token.clone());
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self) -> Result<CachedToken, RelayError> {
        let url = format!("{}/auth/v3/app_access_token/internal", self.base_url);
        let body = serde_json::json!({
            "app_id": self.app_id,
            "app_secret": self.app_secret,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Auth {
                message: format!("app token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Auth {
                message: format!("app token endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: AppTokenResponse =
            response.json().await.map_err(|e| RelayError::Auth {
                message: format!("failed to parse app token response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if parsed.code != 0 {
            return Err(RelayError::Auth {
                message: format!(
                    "app token exchange rejected (code {}): {}",
                    parsed.code, parsed.msg
                ),
                source: None,
            });
        }

        let token = parsed.app_access_token.ok_or_else(|| RelayError::Auth {
            message: "app token response carried no token".to_string(),
            source: None,
        })?;

        let ttl = parsed
            .expire
            .unwrap_or(DEFAULT_TTL_SECS)
            .saturating_sub(SAFETY_MARGIN_SECS);
        info!(ttl_secs = ttl, "app access token issued");

        Ok(CachedToken {
            token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        })
    }
}
