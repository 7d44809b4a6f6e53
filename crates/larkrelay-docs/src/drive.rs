// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drive search backed by the user OAuth credential.
//!
//! The richest strategy: searches the authorizing user's own drive scope,
//! so results cover everything that user can read. Needs a live OAuth
//! grant, which makes it the first to become unavailable.

use std::sync::Arc;

use async_trait::async_trait;

use larkrelay_auth::UserTokenManager;
use larkrelay_core::{DocSearch, RelayError};

use crate::format::{format_results, normalize_query};
use crate::wire::{SEARCH_TIMEOUT, search_drive_files};

pub struct DriveSearch {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<UserTokenManager>,
}

impl DriveSearch {
    pub fn new(base_url: String, auth: Arc<UserTokenManager>) -> Result<Self, RelayError> {
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
            auth,
        })
    }
}

#[async_trait]
impl DocSearch for DriveSearch {
    fn name(&self) -> &str {
        "drive_api"
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn ready(&self) -> bool {
        self.auth.is_authorized().await
    }

    async fn search(&self, query: &str, count: u32) -> Result<String, RelayError> {
        let token = self.auth.get_user_token().await.ok_or_else(|| {
            RelayError::AuthorizationMissing(
                "document search needs a user authorization; visit /auth/url to grant one"
                    .to_string(),
            )
        })?;

        let normalized = normalize_query(query);
        let hits = search_drive_files(&self.http, &self.base_url, &token, &normalized, count).await?;
        Ok(format_results(query, &hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use larkrelay_auth::{AppTokenCache, CredentialRecord, TokenStore};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fresh_record() -> CredentialRecord {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        CredentialRecord {
            access_token: "u-access".into(),
            refresh_token: "u-refresh".into(),
            obtained_at: now,
            expires_in: 7200,
            refresh_expires_in: 2_592_000,
        }
    }

    fn authorized_manager(base_url: &str, dir: &tempfile::TempDir) -> Arc<UserTokenManager> {
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&fresh_record()).unwrap();
        let app = Arc::new(
            AppTokenCache::new(base_url.to_string(), "cli_relay".into(), "secret".into()).unwrap(),
        );
        Arc::new(
            UserTokenManager::new(
                base_url.to_string(),
                app,
                store,
                "http://127.0.0.1:5004/auth/exchange".into(),
                "search:docs:read".into(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn search_normalizes_query_and_formats_hits() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/drive/v1/files/search"))
            .and(header("authorization", "Bearer u-access"))
            .and(body_partial_json(serde_json::json!({
                "search_key": "deploy guide",
                "count": 3,
                "offset": 0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "success",
                "data": {
                    "files": [
                        {"title": "Deploy Guide", "type": "docx", "url": "https://example.com/docx/t1"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let search = DriveSearch::new(server.uri(), authorized_manager(&server.uri(), &dir)).unwrap();

        assert!(search.ready().await);
        let rendered = search.search("Search for Deploy Guide", 3).await.unwrap();
        assert!(rendered.contains("### Document 1: Deploy Guide"));
    }

    #[tokio::test]
    async fn missing_authorization_is_reported_as_such() {
        let server = MockServer::start().await;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        let app = Arc::new(
            AppTokenCache::new(server.uri(), "cli_relay".into(), "secret".into()).unwrap(),
        );
        let auth = Arc::new(
            UserTokenManager::new(
                server.uri(),
                app,
                store,
                "http://127.0.0.1:5004/auth/exchange".into(),
                "search:docs:read".into(),
            )
            .unwrap(),
        );

        let search = DriveSearch::new(server.uri(), auth).unwrap();
        assert!(!search.ready().await);
        let err = search.search("deploys", 3).await.unwrap_err();
        assert!(matches!(err, RelayError::AuthorizationMissing(_)));
    }

    #[tokio::test]
    async fn platform_rejection_surfaces_as_docs_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/drive/v1/files/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 1069902,
                "msg": "search not enabled"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let search = DriveSearch::new(server.uri(), authorized_manager(&server.uri(), &dir)).unwrap();

        let err = search.search("deploys", 3).await.unwrap_err();
        assert!(matches!(err, RelayError::Docs { .. }));
        assert!(err.to_string().contains("1069902"));
    }
}
