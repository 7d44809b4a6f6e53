// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./larkrelay.toml` > `~/.config/larkrelay/larkrelay.toml` > `/etc/larkrelay/larkrelay.toml`
//! with environment variable overrides via `LARKRELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LarkrelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/larkrelay/larkrelay.toml` (system-wide)
/// 3. `~/.config/larkrelay/larkrelay.toml` (user XDG config)
/// 4. `./larkrelay.toml` (local directory)
/// 5. `LARKRELAY_*` environment variables
pub fn load_config() -> Result<LarkrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LarkrelayConfig::default()))
        .merge(Toml::file("/etc/larkrelay/larkrelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("larkrelay/larkrelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("larkrelay.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used in tests and wherever a caller already holds the TOML content.
pub fn load_config_from_str(toml_content: &str) -> Result<LarkrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LarkrelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LarkrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LarkrelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `LARKRELAY_PLATFORM_APP_SECRET`
/// must map to `platform.app_secret`, not `platform.app.secret`.
fn env_provider() -> Env {
    Env::prefixed("LARKRELAY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: LARKRELAY_PLATFORM_APP_SECRET -> "platform_app_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("platform_", "platform.", 1)
            .replacen("admission_", "admission.", 1)
            .replacen("dispatch_", "dispatch.", 1)
            .replacen("augmentation_", "augmentation.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("oauth_", "oauth.", 1);
        mapped.into()
    })
}
