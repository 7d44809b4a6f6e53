// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drive search backed by the app access token.
//!
//! Sees only documents shared with the app itself, but needs no user
//! grant, so it stays usable whenever app credentials are configured.

use std::sync::Arc;

use async_trait::async_trait;

use larkrelay_auth::AppTokenCache;
use larkrelay_core::{DocSearch, RelayError};

use crate::format::{format_results, normalize_query};
use crate::wire::{SEARCH_TIMEOUT, search_drive_files};

pub struct TenantSearch {
    http: reqwest::Client,
    base_url: String,
    app: Arc<AppTokenCache>,
}

impl TenantSearch {
    pub fn new(base_url: String, app: Arc<AppTokenCache>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Docs {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url,
            app,
        })
    }
}

#[async_trait]
impl DocSearch for TenantSearch {
    fn name(&self) -> &str {
        "tenant_api"
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn ready(&self) -> bool {
        self.app.is_configured()
    }

    async fn search(&self, query: &str, count: u32) -> Result<String, RelayError> {
        let token = self.app.get().await?;
        let normalized = normalize_query(query);
        let hits = search_drive_files(&self.http, &self.base_url, &token, &normalized, count).await?;
        Ok(format_results(query, &hits))
    }
}
