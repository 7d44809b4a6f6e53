// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategy registry and selection.
//!
//! Holds every constructed strategy sorted by priority and tracks which one
//! is active. Selection happens once at startup (configuration override
//! first, then highest-priority ready strategy) and can be rebound at
//! runtime through [`StrategyRegistry::switch`], which validates the target
//! before committing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use larkrelay_core::{DocSearch, RelayError};
use larkrelay_prometheus::record_doc_search;

use crate::format::no_results_message;

pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn DocSearch>>,
    active: tokio::sync::RwLock<Arc<dyn DocSearch>>,
}

/// Snapshot of the registry for the admin surface.
#[derive(Debug, Serialize)]
pub struct StrategyInfo {
    pub current_strategy: String,
    pub available_strategies: Vec<StrategyEntry>,
}

#[derive(Debug, Serialize)]
pub struct StrategyEntry {
    pub name: String,
    pub priority: u8,
    pub ready: bool,
}

impl StrategyRegistry {
    /// Build the registry and select the initial strategy.
    ///
    /// An override naming an unknown or unready strategy is ignored with a
    /// warning rather than refused, matching the rest of the degrade-first
    /// posture.
    pub async fn new(
        mut strategies: Vec<Arc<dyn DocSearch>>,
        override_name: Option<&str>,
    ) -> Result<Self, RelayError> {
        strategies.sort_by_key(|s| s.priority());

        let mut active = None;
        if let Some(name) = override_name {
            match find(&strategies, name) {
                Some(strategy) if strategy.ready().await => active = Some(strategy),
                Some(_) => warn!(
                    strategy = name,
                    "configured strategy is not ready; selecting automatically"
                ),
                None => warn!(
                    strategy = name,
                    "configured strategy is unknown; selecting automatically"
                ),
            }
        }

        let active = match active {
            Some(strategy) => strategy,
            None => auto_select(&strategies).await.ok_or_else(|| {
                RelayError::Config("at least one search strategy is required".to_string())
            })?,
        };

        info!(strategy = active.name(), "document search strategy selected");
        Ok(Self {
            strategies,
            active: tokio::sync::RwLock::new(active),
        })
    }

    /// Name of the currently active strategy.
    pub async fn current(&self) -> String {
        self.active.read().await.name().to_string()
    }

    /// Run a search through the active strategy.
    ///
    /// Never fails: a strategy error is logged and rendered as an
    /// empty-result message so the reply pipeline keeps moving.
    pub async fn search(&self, query: &str, count: u32) -> String {
        let active = self.active.read().await.clone();
        record_doc_search(active.name());

        match active.search(query, count).await {
            Ok(text) => text,
            Err(e) => {
                warn!(strategy = active.name(), error = %e, "document search failed");
                no_results_message(query)
            }
        }
    }

    /// Rebind the active strategy. The target must exist and be ready.
    pub async fn switch(&self, name: &str) -> Result<(), RelayError> {
        let target = find(&self.strategies, name).ok_or_else(|| RelayError::Docs {
            message: format!("unknown search strategy '{name}'"),
            source: None,
        })?;

        if !target.ready().await {
            return Err(RelayError::Docs {
                message: format!("search strategy '{name}' is not ready"),
                source: None,
            });
        }

        let mut active = self.active.write().await;
        info!(from = active.name(), to = name, "switching document search strategy");
        *active = target;
        Ok(())
    }

    pub async fn info(&self) -> StrategyInfo {
        let mut available = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            available.push(StrategyEntry {
                name: strategy.name().to_string(),
                priority: strategy.priority(),
                ready: strategy.ready().await,
            });
        }

        StrategyInfo {
            current_strategy: self.current().await,
            available_strategies: available,
        }
    }
}

async fn auto_select(strategies: &[Arc<dyn DocSearch>]) -> Option<Arc<dyn DocSearch>> {
    for strategy in strategies {
        if strategy.ready().await {
            return Some(strategy.clone());
        }
    }
    // Nothing ready; take the lowest-priority terminal strategy.
    strategies.last().cloned()
}

fn find(strategies: &[Arc<dyn DocSearch>], name: &str) -> Option<Arc<dyn DocSearch>> {
    strategies.iter().find(|s| s.name() == name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubSearch {
        name: &'static str,
        priority: u8,
        ready: bool,
        fail: bool,
    }

    #[async_trait]
    impl DocSearch for StubSearch {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        async fn ready(&self) -> bool {
            self.ready
        }

        async fn search(&self, query: &str, _count: u32) -> Result<String, RelayError> {
            if self.fail {
                Err(RelayError::Docs {
                    message: "stub failure".to_string(),
                    source: None,
                })
            } else {
                Ok(format!("{} results for {query}", self.name))
            }
        }
    }

    fn stub(name: &'static str, priority: u8, ready: bool, fail: bool) -> Arc<dyn DocSearch> {
        Arc::new(StubSearch {
            name,
            priority,
            ready,
            fail,
        })
    }

    #[tokio::test]
    async fn auto_selection_takes_highest_priority_ready_strategy() {
        let registry = StrategyRegistry::new(
            vec![
                stub("c", 3, true, false),
                stub("a", 1, false, false),
                stub("b", 2, true, false),
            ],
            None,
        )
        .await
        .unwrap();

        assert_eq!(registry.current().await, "b");
    }

    #[tokio::test]
    async fn override_wins_when_ready() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, true, false), stub("b", 2, true, false)],
            Some("b"),
        )
        .await
        .unwrap();

        assert_eq!(registry.current().await, "b");
    }

    #[tokio::test]
    async fn unready_override_falls_back_to_automatic_selection() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, true, false), stub("b", 2, false, false)],
            Some("b"),
        )
        .await
        .unwrap();

        assert_eq!(registry.current().await, "a");
    }

    #[tokio::test]
    async fn nothing_ready_falls_back_to_the_terminal_strategy() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, false, false), stub("z", 9, false, false)],
            None,
        )
        .await
        .unwrap();

        assert_eq!(registry.current().await, "z");
    }

    #[tokio::test]
    async fn empty_registry_is_refused() {
        assert!(StrategyRegistry::new(Vec::new(), None).await.is_err());
    }

    #[tokio::test]
    async fn search_failure_degrades_to_no_results_message() {
        let registry = StrategyRegistry::new(vec![stub("a", 1, true, true)], None)
            .await
            .unwrap();

        let rendered = registry.search("deploys", 3).await;
        assert_eq!(rendered, "No documents matched 'deploys'.");
    }

    #[tokio::test]
    async fn switch_validates_target_readiness() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, true, false), stub("b", 2, false, false)],
            None,
        )
        .await
        .unwrap();

        assert!(registry.switch("b").await.is_err());
        assert!(registry.switch("missing").await.is_err());
        assert_eq!(registry.current().await, "a");
    }

    #[tokio::test]
    async fn switch_rebinds_the_active_strategy() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, true, false), stub("b", 2, true, true)],
            None,
        )
        .await
        .unwrap();

        registry.switch("b").await.unwrap();
        assert_eq!(registry.current().await, "b");

        // Searches now flow through the new strategy, failures included.
        let rendered = registry.search("deploys", 3).await;
        assert_eq!(rendered, "No documents matched 'deploys'.");
    }

    #[tokio::test]
    async fn info_reports_every_strategy_with_readiness() {
        let registry = StrategyRegistry::new(
            vec![stub("a", 1, true, false), stub("b", 2, false, false)],
            None,
        )
        .await
        .unwrap();

        let info = registry.info().await;
        assert_eq!(info.current_strategy, "a");
        assert_eq!(info.available_strategies.len(), 2);
        assert_eq!(info.available_strategies[0].name, "a");
        assert!(info.available_strategies[0].ready);
        assert!(!info.available_strategies[1].ready);
    }
}
