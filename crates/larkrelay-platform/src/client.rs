// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat platform message API.

use std::sync::Arc;
use std::time::Duration;

use larkrelay_auth::AppTokenCache;
use larkrelay_core::RelayError;

/// Client for the platform's message endpoints.
///
/// Authenticates every call with a fresh app access token drawn from the
/// shared [`AppTokenCache`]. Fetch and send failures degrade rather than
/// propagate: callers get an empty transcript or a `false` send result and
/// the pipeline carries on.
#[derive(Clone)]
pub struct PlatformClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) app: Arc<AppTokenCache>,
}

impl PlatformClient {
    pub fn new(base_url: String, app: Arc<AppTokenCache>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RelayError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url,
            app,
        })
    }

    /// The application id the platform knows this relay by.
    pub fn app_id(&self) -> &str {
        self.app.app_id()
    }
}
