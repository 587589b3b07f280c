//! ml-trader CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use trading_config::load_config;
use trading_monitor::setup_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine; the variables may already be exported.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.is_json();
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file.as_ref().map(PathBuf::from));
    let _guard = setup_logging(&level, json, log_file.as_deref())
        .context("Failed to open log file")?;

    if !matches!(cli.command, Commands::ValidateConfig) {
        config.validate().context("Invalid configuration")?;
    }

    // Execute command
    match cli.command {
        Commands::Fetch(args) => cli::commands::fetch::run(args, &config).await,
        Commands::Train(args) => cli::commands::train::run(args, &config).await,
        Commands::Trade(args) => cli::commands::trade::run(args, &config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&config).await,
    }
}
