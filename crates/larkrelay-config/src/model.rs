// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Larkrelay bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Larkrelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LarkrelayConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat platform API settings (credentials, webhook verification).
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Webhook admission control settings.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Background reply pipeline settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Reply backends, tried in priority order.
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    /// Document retrieval augmentation settings.
    #[serde(default)]
    pub augmentation: AugmentationConfig,

    /// Credential persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// User OAuth flow settings.
    #[serde(default)]
    pub oauth: OauthConfig,
}

// The loader serializes this as its base layer, so every field must agree
// with the serde defaults above.
impl Default for LarkrelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            platform: PlatformConfig::default(),
            admission: AdmissionConfig::default(),
            dispatch: DispatchConfig::default(),
            backends: default_backends(),
            augmentation: AugmentationConfig::default(),
            storage: StorageConfig::default(),
            oauth: OauthConfig::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the webhook listener to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the webhook listener to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5004
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat platform API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Base URL of the platform's open API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Application id issued by the platform.
    #[serde(default)]
    pub app_id: String,

    /// Application secret issued by the platform.
    #[serde(default)]
    pub app_secret: String,

    /// Webhook verification token. Empty disables token verification.
    #[serde(default)]
    pub verification_token: String,

    /// Webhook encrypt key. When set, deliveries are verified by signature
    /// instead of the plaintext token.
    #[serde(default)]
    pub encrypt_key: Option<String>,

    /// Sender ids allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allowed_senders: Vec<String>,

    /// Number of prior messages fetched as conversation context.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: String::new(),
            app_secret: String::new(),
            verification_token: String::new(),
            encrypt_key: None,
            allowed_senders: Vec::new(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://open.feishu.cn/open-apis".to_string()
}

fn default_history_limit() -> u32 {
    20
}

/// Webhook admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Events older than this many seconds are treated as stale redeliveries.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Maximum number of event and message ids remembered for deduplication.
    /// Oldest entries are evicted first once the ledger is full.
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
            ledger_capacity: default_ledger_capacity(),
        }
    }
}

fn default_freshness_window_secs() -> u64 {
    120
}

fn default_ledger_capacity() -> usize {
    1000
}

/// Background reply pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum number of reply pipelines running concurrently. Accepted
    /// events beyond this are acknowledged but dropped.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    32
}

/// One reply backend entry in the `[[backends]]` array.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Name used in logs, metrics, and the stats report.
    pub name: String,

    /// HTTP endpoint the backend listens on.
    pub endpoint: String,

    /// Bearer token sent with each request, if the backend requires one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Cascade order. Lower values are tried first.
    #[serde(default = "default_backend_priority")]
    pub priority: u8,

    /// Per-invocation timeout in seconds.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backends() -> Vec<BackendConfig> {
    vec![BackendConfig {
        name: "primary".to_string(),
        endpoint: "http://localhost:8080/api/reply".to_string(),
        api_key: None,
        priority: default_backend_priority(),
        timeout_secs: default_backend_timeout_secs(),
    }]
}

fn default_backend_priority() -> u8 {
    1
}

fn default_backend_timeout_secs() -> u64 {
    70
}

/// Document retrieval augmentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AugmentationConfig {
    /// Force a specific search strategy (`drive_api`, `tenant_api`, `offline`).
    /// `None` selects the highest-priority ready strategy.
    #[serde(default)]
    pub strategy: Option<String>,

    /// Number of documents requested per search.
    #[serde(default = "default_search_count")]
    pub search_count: u32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            search_count: default_search_count(),
        }
    }
}

fn default_search_count() -> u32 {
    3
}

/// Credential persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the persisted user credential record.
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

fn default_token_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("larkrelay").join("user_token.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("lark_user_token.json"))
        .to_string_lossy()
        .into_owned()
}

/// User OAuth flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OauthConfig {
    /// Redirect URI registered with the platform for the authorization flow.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Scopes requested during authorization.
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
        }
    }
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:5004/auth/exchange".to_string()
}

fn default_scope() -> String {
    "search:docs:read wiki:wiki:readonly".to_string()
}
