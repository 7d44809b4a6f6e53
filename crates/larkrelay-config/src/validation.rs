// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, backend endpoint URLs, and bounded windows.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LarkrelayConfig;

/// Strategy names accepted by `augmentation.strategy`.
pub const KNOWN_STRATEGIES: &[&str] = &["drive_api", "tenant_api", "offline"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LarkrelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty and looks like an IP or hostname
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate log level is a known tracing level
    let level = config.server.log_level.to_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level must be one of trace, debug, info, warn, error; got `{}`",
                config.server.log_level
            ),
        });
    }

    // Validate platform URL and history bounds
    if !config.platform.base_url.starts_with("http") {
        errors.push(ConfigError::Validation {
            message: format!(
                "platform.base_url must be an http(s) URL, got `{}`",
                config.platform.base_url
            ),
        });
    }

    // The platform caps message listing at 50 per page.
    if config.platform.history_limit == 0 || config.platform.history_limit > 50 {
        errors.push(ConfigError::Validation {
            message: format!(
                "platform.history_limit must be between 1 and 50, got {}",
                config.platform.history_limit
            ),
        });
    }

    // Validate admission windows
    if config.admission.freshness_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "admission.freshness_window_secs must be at least 1".to_string(),
        });
    }

    if config.admission.ledger_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "admission.ledger_capacity must be at least 1".to_string(),
        });
    }

    if config.dispatch.max_in_flight == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.max_in_flight must be at least 1".to_string(),
        });
    }

    // Validate backend entries
    let mut seen_names = HashSet::new();
    for (i, backend) in config.backends.iter().enumerate() {
        if backend.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("backends[{i}].name must not be empty"),
            });
        } else if !seen_names.insert(&backend.name) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate backend name `{}` in [[backends]] array",
                    backend.name
                ),
            });
        }

        if !backend.endpoint.starts_with("http") {
            errors.push(ConfigError::Validation {
                message: format!(
                    "backends[{i}].endpoint must be an http(s) URL, got `{}`",
                    backend.endpoint
                ),
            });
        }

        if backend.timeout_secs == 0 {
            errors.push(ConfigError::Validation {
                message: format!("backends[{i}].timeout_secs must be at least 1"),
            });
        }
    }

    // Validate augmentation settings
    if let Some(strategy) = &config.augmentation.strategy
        && !KNOWN_STRATEGIES.contains(&strategy.as_str())
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "augmentation.strategy must be one of {}; got `{strategy}`",
                KNOWN_STRATEGIES.join(", ")
            ),
        });
    }

    if config.augmentation.search_count == 0 || config.augmentation.search_count > 50 {
        errors.push(ConfigError::Validation {
            message: format!(
                "augmentation.search_count must be between 1 and 50, got {}",
                config.augmentation.search_count
            ),
        });
    }

    // Validate storage path is not empty
    if config.storage.token_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.token_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
