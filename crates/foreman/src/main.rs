// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Foreman - cascading model-tier router.
//!
//! This is the binary entry point: it loads configuration, installs logging,
//! and dispatches to the subcommand modules.

mod classify;
mod route;
mod show_config;
mod tiers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foreman_config::ForemanConfig;

/// Foreman - route agent planning commands to the cheapest capable model.
#[derive(Parser, Debug)]
#[command(name = "foreman", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of searching the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Route one command through the tier cascade and print the response.
    Route {
        /// The planning command, e.g. "mine 10 iron".
        command: String,
        /// Model label used in the cache key.
        #[arg(long)]
        model: Option<String>,
        /// Provider label used in the cache key.
        #[arg(long)]
        provider: Option<String>,
        /// Print the response and routing decision as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Classify commands in order without calling any tier.
    Classify {
        /// Commands to classify; earlier ones act as context for later ones.
        #[arg(required = true)]
        commands: Vec<String>,
        /// Print one JSON object per command.
        #[arg(long)]
        json: bool,
    },
    /// List the tier catalog and which tiers are configured.
    Tiers {
        /// Probe every configured backend.
        #[arg(long)]
        check: bool,
    },
    /// Print the effective configuration (API keys redacted).
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.is_file() {
            eprintln!("foreman: config file {} not found", path.display());
            std::process::exit(1);
        }
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            foreman_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);
    foreman_router::register_metrics();
    tracing::info!(
        log_level = %config.logging.level,
        caching = config.cascade.caching_enabled,
        "configuration loaded"
    );

    let result = match cli.command {
        Some(Commands::Route {
            command,
            model,
            provider,
            json,
        }) => {
            route::run_route(
                &config,
                &command,
                model.as_deref(),
                provider.as_deref(),
                json,
            )
            .await
        }
        Some(Commands::Classify { commands, json }) => {
            classify::run_classify(&config, &commands, json);
            Ok(())
        }
        Some(Commands::Tiers { check }) => tiers::run_tiers(&config, check).await,
        Some(Commands::Config) => show_config::run_config(&config),
        None => {
            println!("foreman: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("foreman: {e}");
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<ForemanConfig, Vec<foreman_config::ConfigError>> {
    match path {
        Some(path) => foreman_config::load_and_validate_path(path),
        None => foreman_config::load_and_validate(),
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `logging.level`.
///
/// Logs go to stderr so stdout stays clean for `--json` output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn default_filter(log_level: &str) -> String {
    format!("foreman={log_level},foreman_router={log_level},foreman_openai={log_level},warn")
}
