// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `larkrelay serve` command implementation.
//!
//! Builds the full relay from configuration: credential managers, platform
//! client, augmentation strategies, backend cascade, dispatcher, and the
//! webhook gateway. Runs until a shutdown signal arrives.

use std::sync::Arc;

use larkrelay_auth::{AppTokenCache, TokenStore, UserTokenManager};
use larkrelay_config::LarkrelayConfig;
use larkrelay_config::model::PlatformConfig;
use larkrelay_core::{DocSearch, RelayError};
use larkrelay_docs::{DriveSearch, OfflineSearch, StrategyRegistry, TenantSearch};
use larkrelay_gateway::server::ServerConfig;
use larkrelay_gateway::{
    AdmissionFilter, Dispatcher, GatewayState, RelayStats, Verifier, install_signal_handler,
    start_server,
};
use larkrelay_platform::PlatformClient;
use larkrelay_prometheus::PrometheusRecorder;
use larkrelay_router::{BackendRouter, keyword_trigger};
use tracing::{info, warn};

/// Runs the `larkrelay serve` command.
///
/// Initializes every component from the validated configuration and serves
/// the webhook gateway until the signal handler cancels.
pub async fn run_serve(config: LarkrelayConfig, log_level: &str) -> Result<(), RelayError> {
    init_tracing(log_level);
    info!("starting larkrelay serve");

    // Install the metrics recorder first so component init is already counted.
    let recorder = match PrometheusRecorder::new() {
        Ok(recorder) => {
            info!("prometheus recorder installed");
            Some(recorder)
        }
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        recorder.as_ref().map(|recorder| {
            let handle = recorder.handle().clone();
            Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>
        });

    let app_tokens = Arc::new(AppTokenCache::new(
        config.platform.base_url.clone(),
        config.platform.app_id.clone(),
        config.platform.app_secret.clone(),
    )?);
    if !app_tokens.is_configured() {
        warn!(
            "platform app credentials are not configured; sends and history fetches will fail \
             until platform.app_id and platform.app_secret are set"
        );
    }

    let user_auth = Arc::new(UserTokenManager::new(
        config.platform.base_url.clone(),
        Arc::clone(&app_tokens),
        TokenStore::new(&config.storage.token_path),
        config.oauth.redirect_uri.clone(),
        config.oauth.scope.clone(),
    )?);

    let platform = Arc::new(PlatformClient::new(
        config.platform.base_url.clone(),
        Arc::clone(&app_tokens),
    )?);

    let strategies: Vec<Arc<dyn DocSearch>> = vec![
        Arc::new(DriveSearch::new(
            config.platform.base_url.clone(),
            Arc::clone(&user_auth),
        )?),
        Arc::new(TenantSearch::new(
            config.platform.base_url.clone(),
            Arc::clone(&app_tokens),
        )?),
        Arc::new(OfflineSearch),
    ];
    let docs = Arc::new(
        StrategyRegistry::new(strategies, config.augmentation.strategy.as_deref()).await?,
    );
    info!(strategy = docs.current().await.as_str(), "augmentation strategy selected");

    let router = Arc::new(BackendRouter::from_configs(
        &config.backends,
        Some(Arc::clone(&docs)),
        keyword_trigger(),
        config.augmentation.search_count,
    )?);
    info!(
        backends = router.backend_names().join(",").as_str(),
        "backend cascade configured"
    );

    let stats = Arc::new(RelayStats::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&platform),
        Arc::clone(&router),
        Arc::clone(&stats),
        config.dispatch.max_in_flight,
        config.platform.history_limit,
    ));

    let verifier = select_verifier(&config.platform);
    match &verifier {
        Verifier::Signature(_) => info!("webhook verification: signature mode"),
        Verifier::Token(t) if t.is_empty() => {
            warn!("webhook verification disabled (no verification_token configured)")
        }
        Verifier::Token(_) => info!("webhook verification: token mode"),
    }
    let admission = Arc::new(AdmissionFilter::new(
        verifier,
        config.admission.ledger_capacity,
        config.admission.freshness_window_secs,
    ));

    let state = GatewayState {
        platform,
        user_auth,
        docs,
        router,
        dispatcher,
        admission,
        stats,
        allowed_senders: config.platform.allowed_senders.clone(),
        prometheus_render,
    };

    let cancel = install_signal_handler();
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server_config, state, cancel).await?;

    info!("larkrelay serve shutdown complete");
    Ok(())
}

/// Signature verification wins whenever an encrypt key is configured;
/// otherwise deliveries are checked against the verification token.
fn select_verifier(platform: &PlatformConfig) -> Verifier {
    match &platform.encrypt_key {
        Some(key) if !key.is_empty() => Verifier::Signature(key.clone()),
        _ => Verifier::Token(platform.verification_token.clone()),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("larkrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
