//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ml-trader")]
#[command(author, version, about = "Fetch bars, train a direction classifier and paper trade it live")]
pub struct Cli {
    /// Configuration file path (default: config/default.toml if present)
    #[arg(short, long, env = "TRADING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download historical bars into the training CSV
    Fetch(FetchArgs),
    /// Train the classifier on the training CSV
    Train(TrainArgs),
    /// Paper trade the trained model on live one-minute bars
    Trade(TradeArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Which artifacts a command works on.
#[derive(clap::Args)]
pub struct TargetArgs {
    /// Data source (alpaca, yfinance)
    #[arg(long)]
    pub source: Option<String>,

    /// Ticker symbol
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Directory holding CSV and model artifacts
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Alpaca lookback in days
    #[arg(long)]
    pub days: Option<u32>,

    /// Alpaca bar size (e.g. 1Hour, 15Min, 1Day)
    #[arg(short, long)]
    pub timeframe: Option<String>,

    /// Yahoo Finance start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Yahoo Finance end date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(clap::Args)]
pub struct TrainArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(clap::Args)]
pub struct TradeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Polling interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Units bought on every Open
    #[arg(long)]
    pub stake: Option<Decimal>,

    /// Starting cash
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Stop after this many new bars
    #[arg(long)]
    pub max_bars: Option<usize>,

    /// Output format for the final report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_args(extra: &[&str]) -> Result<TradeArgs, clap::Error> {
        let argv = ["ml-trader", "trade"].iter().chain(extra);
        match Cli::try_parse_from(argv)?.command {
            Commands::Trade(args) => Ok(args),
            _ => panic!("parsed a different subcommand"),
        }
    }

    #[test]
    fn test_output_defaults_to_text() {
        assert_eq!(trade_args(&[]).unwrap().output, OutputFormat::Text);
        assert_eq!(trade_args(&["--output", "json"]).unwrap().output, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_output_is_rejected() {
        let err = trade_args(&["--output", "xml"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
