//! `tourney`, the command-line control panel for the tournament
//! scoreboard.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments
//! 2. Load configuration from `tourney-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Open the ledger engine over the data directory
//! 5. Run the command

mod cli;
mod commands;
mod error;

use clap::Parser;
use tourney_core::TourneyConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TourneyConfig::load_or_default(&cli.config)
        .map_err(crate::error::CliError::from)?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_env| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!(
        config = %cli.config.display(),
        data_dir = %config.storage.data_dir.display(),
        "Configuration loaded"
    );

    commands::run_command(cli, &config).await?;
    Ok(())
}
