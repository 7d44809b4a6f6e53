// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state, and runs the listener until
//! the shutdown token fires.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use larkrelay_auth::UserTokenManager;
use larkrelay_core::RelayError;
use larkrelay_docs::StrategyRegistry;
use larkrelay_platform::PlatformClient;
use larkrelay_router::BackendRouter;

use crate::admission::AdmissionFilter;
use crate::dispatch::Dispatcher;
use crate::handlers;
use crate::stats::RelayStats;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Platform API client (history fetch, message send).
    pub platform: Arc<PlatformClient>,
    /// User-level credential manager behind the auth endpoints.
    pub user_auth: Arc<UserTokenManager>,
    /// Document search strategy registry.
    pub docs: Arc<StrategyRegistry>,
    /// Reply backend cascade.
    pub router: Arc<BackendRouter>,
    /// Background reply pipelines.
    pub dispatcher: Arc<Dispatcher>,
    /// Webhook admission control.
    pub admission: Arc<AdmissionFilter>,
    /// Processing counters.
    pub stats: Arc<RelayStats>,
    /// Sender ids allowed to talk to the bot. Empty allows everyone.
    pub allowed_senders: Vec<String>,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Gateway server configuration (mirrors `[server]` from larkrelay-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Assemble the full route table over `state`.
pub fn build_router(state: GatewayState) -> Router {
    // Unauthenticated surface for the platform, systemd, and Prometheus.
    let public_routes = Router::new()
        .route("/callback", post(handlers::post_callback))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    // Operator surface.
    let admin_routes = Router::new()
        .route("/test/send", post(handlers::post_test_send))
        .route("/stats", get(handlers::get_stats))
        .route("/auth/status", get(handlers::get_auth_status))
        .route("/auth/url", get(handlers::get_auth_url))
        .route("/auth/exchange", get(handlers::get_auth_exchange))
        .route(
            "/strategy",
            get(handlers::get_strategy).post(handlers::post_strategy),
        )
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until `shutdown` fires;
/// in-flight reply pipelines are not drained.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Internal(format!("failed to bind webhook listener to {addr}: {e}")))?;

    tracing::info!("webhook gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| RelayError::Internal(format!("webhook gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use larkrelay_auth::{AppTokenCache, TokenStore};
    use larkrelay_core::DocSearch;
    use larkrelay_docs::OfflineSearch;
    use larkrelay_router::keyword_trigger;

    use crate::admission::Verifier;

    use super::*;

    async fn test_state(dir: &std::path::Path) -> GatewayState {
        let base = "http://127.0.0.1:1".to_string();
        let app = Arc::new(
            AppTokenCache::new(base.clone(), "cli_app".to_string(), "secret".to_string()).unwrap(),
        );
        let platform = Arc::new(PlatformClient::new(base.clone(), Arc::clone(&app)).unwrap());
        let user_auth = Arc::new(
            UserTokenManager::new(
                base,
                app,
                TokenStore::new(dir.join("token.json")),
                "http://127.0.0.1:5004/auth/exchange".to_string(),
                "search:docs:read".to_string(),
            )
            .unwrap(),
        );
        let docs = Arc::new(
            StrategyRegistry::new(vec![Arc::new(OfflineSearch) as Arc<dyn DocSearch>], None)
                .await
                .unwrap(),
        );
        let router = Arc::new(BackendRouter::new(Vec::new(), None, keyword_trigger(), 3));
        let stats = Arc::new(RelayStats::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&platform),
            Arc::clone(&router),
            Arc::clone(&stats),
            4,
            20,
        ));
        let admission = Arc::new(AdmissionFilter::new(
            Verifier::Token(String::new()),
            100,
            120,
        ));

        GatewayState {
            platform,
            user_auth,
            docs,
            router,
            dispatcher,
            admission,
            stats,
            allowed_senders: Vec::new(),
            prometheus_render: None,
        }
    }

    #[tokio::test]
    async fn gateway_state_is_clone() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let _cloned = state.clone();
    }

    #[tokio::test]
    async fn route_table_builds_over_a_full_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let _app = build_router(state);
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5004,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
