//! Trade command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use trading_broker::PaperBroker;
use trading_config::AppConfig;
use trading_core::atomic::write_atomic;
use trading_data::AlpacaDataClient;
use trading_live::{LiveBarPoller, LiveSession, SessionConfig};
use trading_strategies::{MlStrategy, MlStrategyConfig};

use crate::cli::{OutputFormat, TradeArgs};

pub async fn run(args: TradeArgs, config: &AppConfig) -> Result<()> {
    let target = args.target.resolve(config)?;

    // Live bars always come from Alpaca; --source only selects the model.
    let credentials = config
        .alpaca_credentials()
        .context("Alpaca credentials are required for live bars")?;
    let model_path = target.paths.require_model(target.source, &target.symbol)?;
    let strategy = MlStrategy::from_artifact(MlStrategyConfig::default(), &model_path)?;

    let capital = starting_capital(args.capital, config)?;
    let stake = args.stake.unwrap_or(config.trading.stake);
    let interval = Duration::from_secs(args.interval.unwrap_or(config.trading.poll_interval_secs));

    let broker = PaperBroker::new(capital)
        .with_slippage(config.trading.slippage_pct)
        .with_commission(config.trading.commission);
    let client = AlpacaDataClient::new(credentials)?;
    let poller = LiveBarPoller::new(client, target.symbol.clone(), interval)?;
    let mut session = LiveSession::new(
        poller,
        Box::new(strategy),
        broker,
        SessionConfig::new(target.symbol.clone(), target.source, stake),
    )?;

    println!("Starting Portfolio Value: {:.2}", capital);
    info!(
        symbol = %target.symbol,
        model = %model_path.display(),
        "Paper trading started; press Ctrl-C to stop"
    );

    let report = session.run(shutdown_signal(), args.max_bars).await?;

    println!("Final Portfolio Value: {:.2}", report.stats.final_equity);
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(save_path) = &args.save {
        save_report(save_path, &report.to_json()?)?;
        info!("Report saved to {:?}", save_path);
    }

    Ok(())
}

/// `--capital` if given, else the configured starting capital. Must be positive.
fn starting_capital(flag: Option<Decimal>, config: &AppConfig) -> Result<Decimal> {
    match flag {
        Some(capital) if capital <= Decimal::ZERO => {
            anyhow::bail!("--capital must be positive, got {}", capital)
        }
        Some(capital) => Ok(capital),
        None => Ok(config.trading.starting_capital),
    }
}

fn save_report(path: &Path, json: &str) -> Result<()> {
    write_atomic(path, json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the bar budget is the only way out.
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
