// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `larkrelay status` and `larkrelay auth-url` command implementations.
//!
//! Both read the persisted user credential through the same manager the
//! server uses, so the report matches what the gateway would serve.

use std::io::IsTerminal;
use std::sync::Arc;

use larkrelay_auth::{AppTokenCache, TokenStatus, TokenStore, UserTokenManager};
use larkrelay_config::LarkrelayConfig;
use larkrelay_core::RelayError;

/// Builds the credential manager from configuration without touching the
/// network. Token exchange only happens on explicit operator action.
fn build_user_auth(config: &LarkrelayConfig) -> Result<UserTokenManager, RelayError> {
    let app_tokens = Arc::new(AppTokenCache::new(
        config.platform.base_url.clone(),
        config.platform.app_id.clone(),
        config.platform.app_secret.clone(),
    )?);
    UserTokenManager::new(
        config.platform.base_url.clone(),
        app_tokens,
        TokenStore::new(&config.storage.token_path),
        config.oauth.redirect_uri.clone(),
        config.oauth.scope.clone(),
    )
}

/// Run the `larkrelay status` command.
///
/// If `--json` is passed, outputs the raw credential status for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(
    config: &LarkrelayConfig,
    json: bool,
    plain: bool,
) -> Result<(), RelayError> {
    let manager = build_user_auth(config)?;
    let status = manager.status().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_report(&status, &config.storage.token_path, use_color);
    Ok(())
}

/// Run the `larkrelay auth-url` command.
pub fn run_auth_url(config: &LarkrelayConfig) -> Result<(), RelayError> {
    let manager = build_user_auth(config)?;
    println!("{}", manager.authorize_url(None)?);
    Ok(())
}

/// Format seconds into a human-readable duration string.
fn format_remaining(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Print the credential report with optional colors.
fn print_report(status: &TokenStatus, token_path: &str, use_color: bool) {
    println!();
    println!("  larkrelay credentials");
    println!("  {}", "-".repeat(35));

    if status.authorized {
        let remaining = status
            .expires_in_seconds
            .map(format_remaining)
            .unwrap_or_else(|| "unknown".to_string());

        if use_color {
            use colored::Colorize;
            println!(
                "    User:     {} {} (expires in {})",
                "✓".green(),
                "authorized".green(),
                remaining
            );
        } else {
            println!("    User:     [OK] authorized (expires in {remaining})");
        }

        if let Some(obtained) = &status.obtained_at {
            println!("    Obtained: {obtained}");
        }
        if let Some(days) = status.refresh_expires_in_days {
            println!("    Refresh:  valid for {days}d");
        }
        if status.is_expiring_soon == Some(true) {
            if use_color {
                use colored::Colorize;
                println!("    Note:     {}", "access token is about to refresh".yellow());
            } else {
                println!("    Note:     access token is about to refresh");
            }
        }
    } else {
        if use_color {
            use colored::Colorize;
            println!("    User:     {} {}", "✗".red(), "not authorized".red());
        } else {
            println!("    User:     [FAIL] not authorized");
        }
        if let Some(message) = &status.message {
            println!("    Detail:   {message}");
        }
        println!("    Store:    {token_path}");
        println!();
        println!("  Authorize with: larkrelay auth-url");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_remaining_minutes() {
        assert_eq!(format_remaining(120), "2m");
    }

    #[test]
    fn format_remaining_hours() {
        assert_eq!(format_remaining(3720), "1h 2m");
    }

    #[test]
    fn format_remaining_days() {
        assert_eq!(format_remaining(90060), "1d 1h 1m");
    }

    #[tokio::test]
    async fn status_of_an_empty_store_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LarkrelayConfig::default();
        config.storage.token_path = dir
            .path()
            .join("token.json")
            .to_string_lossy()
            .into_owned();

        let manager = build_user_auth(&config).unwrap();
        let status = manager.status().await;
        assert!(!status.authorized);
    }

    #[test]
    fn auth_url_uses_the_configured_redirect() {
        let config = LarkrelayConfig::default();
        let manager = build_user_auth(&config).unwrap();
        let url = manager.authorize_url(None).unwrap();
        assert!(url.contains("redirect_uri="));
    }
}
