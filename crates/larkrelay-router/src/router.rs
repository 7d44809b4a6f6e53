// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cascading backend selection.
//!
//! Backends are tried in priority order, each under its own deadline. The
//! first success wins; a failure or timeout advances the cascade. When the
//! list is exhausted, the local responder takes over, so `reply` itself
//! cannot fail.

use std::sync::Arc;

use tracing::{debug, info, warn};

use larkrelay_config::BackendConfig;
use larkrelay_core::{RelayError, ReplyBackend, ReplyRequest};
use larkrelay_docs::StrategyRegistry;
use larkrelay_prometheus::{record_backend_failure, record_backend_invocation};

use crate::http::HttpBackend;
use crate::local::LocalResponder;
use crate::predicate::SearchPredicate;

pub struct BackendRouter {
    backends: Vec<Arc<dyn ReplyBackend>>,
    local: LocalResponder,
    docs: Option<Arc<StrategyRegistry>>,
    trigger: SearchPredicate,
    search_count: u32,
}

impl BackendRouter {
    /// Build from explicit backends, already in the order to try them.
    pub fn new(
        backends: Vec<Arc<dyn ReplyBackend>>,
        docs: Option<Arc<StrategyRegistry>>,
        trigger: SearchPredicate,
        search_count: u32,
    ) -> Self {
        Self {
            backends,
            local: LocalResponder,
            docs,
            trigger,
            search_count,
        }
    }

    /// Build HTTP backends from configuration, sorted by priority.
    pub fn from_configs(
        configs: &[BackendConfig],
        docs: Option<Arc<StrategyRegistry>>,
        trigger: SearchPredicate,
        search_count: u32,
    ) -> Result<Self, RelayError> {
        let mut ordered: Vec<&BackendConfig> = configs.iter().collect();
        ordered.sort_by_key(|config| config.priority);

        let backends = ordered
            .into_iter()
            .map(|config| {
                Ok(Arc::new(HttpBackend::from_config(config)?) as Arc<dyn ReplyBackend>)
            })
            .collect::<Result<Vec<_>, RelayError>>()?;

        Ok(Self::new(backends, docs, trigger, search_count))
    }

    /// Names of the configured backends, in cascade order.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends
            .iter()
            .map(|backend| backend.name().to_string())
            .collect()
    }

    /// Produce a reply. Never fails.
    pub async fn reply(&self, request: &ReplyRequest) -> String {
        let outbound = self.augment(request).await;

        match self.try_backends(&outbound).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "falling back to the local responder");
                self.local.reply(&request.message)
            }
        }
    }

    /// Prepend retrieved document context when the message asks for it.
    async fn augment(&self, request: &ReplyRequest) -> ReplyRequest {
        let mut outbound = request.clone();

        if let Some(docs) = &self.docs
            && let Some(query) = (self.trigger)(&request.message)
        {
            debug!(query = %query, "message classified as knowledge-seeking");
            let context = docs.search(&query, self.search_count).await;
            outbound.message = format!(
                "{context}\n\n---\n\nUser question: {}",
                request.message
            );
        }

        outbound
    }

    async fn try_backends(&self, request: &ReplyRequest) -> Result<String, RelayError> {
        for backend in &self.backends {
            record_backend_invocation(backend.name());
            let deadline = backend.timeout();

            match tokio::time::timeout(deadline, backend.invoke(request)).await {
                Ok(Ok(text)) => {
                    info!(backend = backend.name(), "backend produced a reply");
                    return Ok(text);
                }
                Ok(Err(e)) => {
                    record_backend_failure(backend.name());
                    warn!(backend = backend.name(), error = %e, "backend failed, advancing");
                }
                Err(_) => {
                    record_backend_failure(backend.name());
                    let e = RelayError::Timeout { duration: deadline };
                    warn!(backend = backend.name(), error = %e, "backend timed out, advancing");
                }
            }
        }

        Err(RelayError::BackendExhausted {
            attempted: self.backends.len(),
        })
    }
}
