// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Larkrelay - a webhook-to-AI reply bridge for Lark/Feishu workspaces.
//!
//! This is the binary entry point for the relay.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

mod serve;
mod status;

/// Larkrelay - a webhook-to-AI reply bridge for Lark/Feishu workspaces.
#[derive(Parser, Debug)]
#[command(name = "larkrelay", version, about, long_about = None)]
struct Cli {
    /// Load this configuration file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeat for more).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook gateway until interrupted.
    Serve,
    /// Show the user credential status.
    Status {
        /// Output structured JSON instead of the human report.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the operator consent URL for user authorization.
    AuthUrl,
    /// Validate the configuration and exit.
    CheckConfig,
}

impl Cli {
    /// Effective log level: flags override the configured default.
    fn log_level(&self, configured: &str) -> String {
        if self.quiet {
            "error".to_string()
        } else {
            match self.verbose {
                0 => configured.to_string(),
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => larkrelay_config::load_and_validate_path(path),
        None => larkrelay_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            larkrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let log_level = cli.log_level(&config.server.log_level);

    let outcome = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config, &log_level).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::AuthUrl) => status::run_auth_url(&config),
        Some(Commands::CheckConfig) => {
            println!("configuration ok");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_parses_with_config_override() {
        let cli = Cli::parse_from(["larkrelay", "--config", "/tmp/custom.toml", "serve"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/custom.toml")));
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn status_parses_flags() {
        let cli = Cli::parse_from(["larkrelay", "-vv", "status", "--json"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Some(Commands::Status { json: true, plain: false })
        ));
    }

    #[test]
    fn verbosity_overrides_configured_level() {
        let cli = Cli::parse_from(["larkrelay", "serve"]);
        assert_eq!(cli.log_level("info"), "info");

        let cli = Cli::parse_from(["larkrelay", "-v", "serve"]);
        assert_eq!(cli.log_level("info"), "debug");

        let cli = Cli::parse_from(["larkrelay", "-q", "serve"]);
        assert_eq!(cli.log_level("info"), "error");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = larkrelay_config::load_and_validate_str("").expect("defaults should be valid");
        assert_eq!(config.server.port, 5004);
    }
}
