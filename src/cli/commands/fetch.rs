//! Fetch command implementation.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use tracing::info;
use trading_config::AppConfig;
use trading_core::traits::{BarsRequest, MarketData};
use trading_core::types::{DataSourceKind, Timeframe};
use trading_data::{fetch_to_csv, AlpacaDataClient, CsvBarStore, YahooDataClient};

use crate::cli::FetchArgs;

pub async fn run(args: FetchArgs, config: &AppConfig) -> Result<()> {
    let target = args.target.resolve(config)?;
    reject_foreign_flags(target.source, &args)?;
    let path = target.paths.training_data(target.source, &target.symbol);

    let (client, request): (Box<dyn MarketData>, BarsRequest) = match target.source {
        DataSourceKind::Alpaca => {
            let credentials = config
                .alpaca_credentials()
                .context("Alpaca credentials are required for --source alpaca")?;
            let timeframe = match &args.timeframe {
                Some(raw) => raw
                    .parse::<Timeframe>()
                    .map_err(anyhow::Error::msg)
                    .context("Invalid --timeframe")?,
                None => config.fetch.timeframe()?,
            };
            let days = args.days.unwrap_or(config.fetch.days);
            let end = Utc::now();
            let start = end - Duration::days(i64::from(days));

            (
                Box::new(AlpacaDataClient::new(credentials)?) as Box<dyn MarketData>,
                BarsRequest::between(target.symbol.clone(), timeframe, start, end),
            )
        }
        DataSourceKind::YFinance => {
            let start = date_arg(args.start.as_deref(), config.fetch.yahoo_start, "--start")?;
            let end = date_arg(args.end.as_deref(), config.fetch.yahoo_end, "--end")?;
            if start >= end {
                anyhow::bail!("--start {} must be before --end {}", start, end);
            }

            (
                Box::new(YahooDataClient::new()?) as Box<dyn MarketData>,
                BarsRequest::between(
                    target.symbol.clone(),
                    Timeframe::Daily,
                    start.and_time(NaiveTime::MIN).and_utc(),
                    end.and_time(NaiveTime::MIN).and_utc(),
                ),
            )
        }
    };

    info!(
        source = %target.source,
        symbol = %target.symbol,
        timeframe = %request.timeframe,
        path = %path.display(),
        "Fetching historical bars"
    );

    let store = CsvBarStore::new(&path);
    let count = fetch_to_csv(client.as_ref(), &request, &store)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", target.symbol, target.source))?;

    println!("Saved {} bars to {}", count, path.display());
    Ok(())
}

/// Range flags belong to one source each; passing another source's flag is
/// an error rather than a silent no-op.
fn reject_foreign_flags(source: DataSourceKind, args: &FetchArgs) -> Result<()> {
    let foreign = match source {
        DataSourceKind::Alpaca => [("--start", args.start.is_some()), ("--end", args.end.is_some())],
        DataSourceKind::YFinance => [
            ("--days", args.days.is_some()),
            ("--timeframe", args.timeframe.is_some()),
        ],
    };
    match foreign.iter().find(|(_, given)| *given) {
        Some((flag, _)) => anyhow::bail!("{} does not apply to --source {}", flag, source),
        None => Ok(()),
    }
}

fn date_arg(raw: Option<&str>, default: NaiveDate, flag: &str) -> Result<NaiveDate> {
    match raw {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid {} date {:?}, expected YYYY-MM-DD", flag, raw)),
        None => Ok(default),
    }
}
