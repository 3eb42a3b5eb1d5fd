//! SkillCoach command-line client - Main entry point
//!
//! Resolves configuration (command line > environment > TOML file >
//! defaults), installs logging on stderr and runs one command.

use anyhow::{Context, Result};
use clap::Parser;
use skillcoach_client::cli::{commands, Cli};
use skillcoach_common::config::ConfigResolver;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigResolver::new(cli.overrides())
        .resolve()
        .context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "skillcoach_client={level},skillcoach_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(base_url = %config.base_url, "Starting skillcoach {}", env!("CARGO_PKG_VERSION"));

    commands::run(cli, config).await
}
