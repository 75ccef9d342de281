//! # sensord CLI
//!
//! Entry point for the sensor acquisition daemon.
//!
//! Provides:
//! - Configuration loading and validation
//! - Daemon orchestration (driver thread, dispatcher, state listener)
//! - Signal handling: shutdown and session reinit

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_daemon, run_info, run_validate};
use pipeline::RunExit;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "sensord starting");

    let result = match &cli.command {
        Commands::Run(args) => match run_daemon(args).await {
            // Diagnostic contract: exit status is the enumerated sensor count
            Ok(RunExit::TestMode(count)) => std::process::exit(count as i32),
            Ok(RunExit::Shutdown) => Ok(()),
            Err(e) => Err(e),
        },
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "command failed");
    }

    result
}

/// Logging only; the metrics endpoint is installed by `run` when a port is
/// configured.
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_logging(&observability::LoggingConfig::from_verbosity(
        cli.log_format.into(),
        cli.quiet,
        cli.verbose,
    ))
}
