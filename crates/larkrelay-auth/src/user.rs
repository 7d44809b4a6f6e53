// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User OAuth credential manager.
//!
//! Drives the authorization-code flow: builds the consent URL, exchanges the
//! callback code for tokens, persists the grant, and transparently refreshes
//! the access token as it approaches expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use larkrelay_core::RelayError;

use crate::app::AppTokenCache;
use crate::record::{CredentialRecord, TokenStatus, default_expires_in, default_refresh_expires_in};
use crate::store::TokenStore;

/// Manages the user-level OAuth credential.
///
/// The in-memory record mirrors the persisted store. All token reads go
/// through [`UserTokenManager::get_user_token`], which refreshes inside the
/// buffer window and reports an absent credential as `None` rather than an
/// error, keeping callers on their degraded paths.
pub struct UserTokenManager {
    http: reqwest::Client,
    base_url: String,
    app: Arc<AppTokenCache>,
    store: TokenStore,
    redirect_uri: String,
    scope: String,
    record: tokio::sync::Mutex<Option<CredentialRecord>>,
}

#[derive(Debug, Deserialize)]
struct UserTokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<UserTokenData>,
}

#[derive(Debug, Deserialize)]
struct UserTokenData {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default = "default_refresh_expires_in")]
    refresh_expires_in: u64,
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

impl UserTokenManager {
    pub fn new(
        base_url: String,
        app: Arc<AppTokenCache>,
        store: TokenStore,
        redirect_uri: String,
        scope: String,
    ) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RelayError::Auth {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let record = store.load();
        if record.is_some() {
            info!(path = %store.path().display(), "loaded persisted user credential");
        }

        Ok(Self {
            http,
            base_url,
            app,
            store,
            redirect_uri,
            scope,
            record: tokio::sync::Mutex::new(record),
        })
    }

    /// Build the authorization URL the operator opens in a browser.
    ///
    /// `state` defaults to a fresh `larkrelay_<unix>` marker when not given.
    pub fn authorize_url(&self, state: Option<&str>) -> Result<String, RelayError> {
        let mut url = reqwest::Url::parse(&format!("{}/authen/v1/authorize", self.base_url))
            .map_err(|e| RelayError::Config(format!("invalid platform base URL: {e}")))?;

        let state = state
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("larkrelay_{}", unix_now()));

        url.query_pairs_mut()
            .append_pair("app_id", self.app.app_id())
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", &state)
            .append_pair("scope", &self.scope);

        Ok(url.into())
    }

    /// Exchange an authorization code for user tokens and persist the grant.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenStatus, RelayError> {
        let url = format!("{}/authen/v1/oidc/access_token", self.base_url);
        let body = serde_json::json!({
            "grant_type": "authorization_code",
            "code": code,
        });

        let data = self.token_request(&url, &body).await?;
        let record = self.install(data).await;
        Ok(TokenStatus::from_record(&record, unix_now()))
    }

    /// Current valid user access token.
    ///
    /// Refreshes when the token is inside the buffer window. Returns `None`
    /// when no grant exists, the refresh token has expired, or the refresh
    /// call fails.
    pub async fn get_user_token(&self) -> Option<String> {
        let mut guard = self.record.lock().await;
        let record = guard.as_ref()?;
        let now = unix_now();

        if !record.is_expiring_soon_at(now) {
            return Some(record.access_token.clone());
        }

        if !record.refresh_usable_at(now) {
            warn!("refresh token expired; re-authorization required");
            return None;
        }

        let refresh_token = record.refresh_token.clone();
        match self.refresh(&refresh_token).await {
            Ok(data) => {
                let record = self.persist(data);
                let token = record.access_token.clone();
                *guard = Some(record);
                info!("user access token refreshed");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "user token refresh failed");
                None
            }
        }
    }

    /// Whether a usable grant exists (valid access token or live refresh token).
    pub async fn is_authorized(&self) -> bool {
        let guard = self.record.lock().await;
        match guard.as_ref() {
            Some(record) => {
                let now = unix_now();
                record.remaining_at(now) > 0 || record.refresh_usable_at(now)
            }
            None => false,
        }
    }

    /// Status report for the status endpoint and the CLI.
    pub async fn status(&self) -> TokenStatus {
        let guard = self.record.lock().await;
        match guard.as_ref() {
            Some(record) => TokenStatus::from_record(record, unix_now()),
            None => TokenStatus::unauthorized(),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<UserTokenData, RelayError> {
        let url = format!("{}/authen/v1/oidc/refresh_access_token", self.base_url);
        let body = serde_json::json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        self.token_request(&url, &body).await
    }

    /// POST a token grant request authenticated with the app access token.
    async fn token_request(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<UserTokenData, RelayError> {
        let app_token = self.app.get().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(app_token)
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::Auth {
                message: format!("token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Auth {
                message: format!("token endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: UserTokenResponse =
            response.json().await.map_err(|e| RelayError::Auth {
                message: format!("failed to parse token response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if parsed.code != 0 {
            return Err(RelayError::Auth {
                message: format!("token grant rejected (code {}): {}", parsed.code, parsed.msg),
                source: None,
            });
        }

        parsed.data.ok_or_else(|| RelayError::Auth {
            message: "token response carried no data".to_string(),
            source: None,
        })
    }

    /// Stamp, persist, and return a record for freshly issued tokens.
    fn persist(&self, data: UserTokenData) -> CredentialRecord {
        let record = CredentialRecord {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
            obtained_at: unix_now(),
            expires_in: data.expires_in,
            refresh_expires_in: data.refresh_expires_in,
        };

        // A failed write keeps the grant usable for this process lifetime.
        if let Err(e) = self.store.save(&record) {
            warn!(error = %e, "failed to persist user credential");
        }

        record
    }

    async fn install(&self, data: UserTokenData) -> CredentialRecord {
        let record = self.persist(data);
        *self.record.lock().await = Some(record.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_token_mock() -> Mock {
        Mock::given(method("POST"))
            .and(path("/auth/v3/app_access_token/internal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "app_access_token": "t-app",
                "expire": 7200
            })))
    }

    fn manager(base_url: &str, store: TokenStore) -> UserTokenManager {
        let app = Arc::new(
            AppTokenCache::new(base_url.to_string(), "cli_test".into(), "secret".into()).unwrap(),
        );
        UserTokenManager::new(
            base_url.to_string(),
            app,
            store,
            "http://127.0.0.1:5004/auth/exchange".into(),
            "search:docs:read wiki:wiki:readonly".into(),
        )
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_flow_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let manager = manager("https://open.example.com/open-apis", store);

        let url = manager.authorize_url(None).unwrap();
        assert!(url.starts_with("https://open.example.com/open-apis/authen/v1/authorize?"));
        assert!(url.contains("app_id=cli_test"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=larkrelay_"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5004%2Fauth%2Fexchange"));

        let explicit = manager.authorize_url(Some("fixed-state")).unwrap();
        assert!(explicit.contains("state=fixed-state"));
    }

    #[tokio::test]
    async fn exchange_code_persists_and_reports_authorized() {
        let server = MockServer::start().await;
        app_token_mock().mount(&server).await;

        Mock::given(method("POST"))
            .and(path("/authen/v1/oidc/access_token"))
            .and(header("authorization", "Bearer t-app"))
            .and(body_partial_json(serde_json::json!({
                "grant_type": "authorization_code",
                "code": "c-123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "data": {
                    "access_token": "u-access",
                    "refresh_token": "u-refresh",
                    "expires_in": 7200,
                    "refresh_expires_in": 2592000
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let manager = manager(&server.uri(), store.clone());

        let status = manager.exchange_code("c-123").await.unwrap();
        assert!(status.authorized);
        assert_eq!(status.is_expiring_soon, Some(false));

        // The grant survives in the store for the next process.
        let persisted = store.load().unwrap();
        assert_eq!(persisted.access_token, "u-access");
        assert_eq!(persisted.refresh_token, "u-refresh");
        assert!(persisted.obtained_at > 0);

        assert_eq!(manager.get_user_token().await.as_deref(), Some("u-access"));
        assert!(manager.is_authorized().await);
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_and_repersisted() {
        let server = MockServer::start().await;
        app_token_mock().mount(&server).await;

        Mock::given(method("POST"))
            .and(path("/authen/v1/oidc/refresh_access_token"))
            .and(body_partial_json(serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": "u-refresh-old"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "data": {
                    "access_token": "u-access-new",
                    "refresh_token": "u-refresh-new",
                    "expires_in": 7200,
                    "refresh_expires_in": 2592000
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        // Access token deep inside the buffer, refresh token still live.
        store
            .save(&CredentialRecord {
                access_token: "u-access-old".into(),
                refresh_token: "u-refresh-old".into(),
                obtained_at: unix_now() - 7000,
                expires_in: 7200,
                refresh_expires_in: 2_592_000,
            })
            .unwrap();

        let manager = manager(&server.uri(), store.clone());
        let token = manager.get_user_token().await;
        assert_eq!(token.as_deref(), Some("u-access-new"));

        let persisted = store.load().unwrap();
        assert_eq!(persisted.refresh_token, "u-refresh-new");
    }

    #[tokio::test]
    async fn failed_refresh_yields_none_not_error() {
        let server = MockServer::start().await;
        app_token_mock().mount(&server).await;

        Mock::given(method("POST"))
            .and(path("/authen/v1/oidc/refresh_access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 20005,
                "msg": "refresh token invalid"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&CredentialRecord {
                access_token: "u-access-old".into(),
                refresh_token: "u-refresh-old".into(),
                obtained_at: unix_now() - 7000,
                expires_in: 7200,
                refresh_expires_in: 2_592_000,
            })
            .unwrap();

        let manager = manager(&server.uri(), store);
        assert!(manager.get_user_token().await.is_none());
    }

    #[tokio::test]
    async fn spent_refresh_window_requires_reauthorization() {
        let server = MockServer::start().await;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        // Both tokens are long gone. No HTTP call should happen.
        store
            .save(&CredentialRecord {
                access_token: "u-access-old".into(),
                refresh_token: "u-refresh-old".into(),
                obtained_at: 1_000,
                expires_in: 7200,
                refresh_expires_in: 10_000,
            })
            .unwrap();

        let manager = manager(&server.uri(), store);
        assert!(manager.get_user_token().await.is_none());
        assert!(!manager.is_authorized().await);
    }

    #[tokio::test]
    async fn status_without_grant_reports_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        let manager = manager("http://127.0.0.1:1", store);

        let status = manager.status().await;
        assert!(!status.authorized);
        assert!(status.message.is_some());
    }
}
