//! # tallyd CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - The `server` command: the aggregation daemon itself
//! - The `send` command: submit one metric to a running daemon
//! - Logging initialization and graceful shutdown handling

mod cli;
mod commands;
mod daemon;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_send, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "tallyd starting");

    let result = match &cli.command {
        Commands::Server(args) => run_server(&cli, args).await,
        Commands::Send(args) => run_send(&cli, args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        default_log_level: cli.log_level.clone(),
    })
}
