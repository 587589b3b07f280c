//! Yahoo Finance chart API client.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::{BarRange, BarsRequest, MarketData};
use trading_core::types::{Bar, Timeframe};

pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; ml-trader)";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zip the column arrays into bars, skipping rows with any missing price.
    fn into_bars(self) -> Vec<Bar> {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
            values.get(i).copied().flatten()
        }

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let timestamp = DateTime::from_timestamp(ts, 0)?;
                let bar = Bar::new(
                    timestamp,
                    column(&quote.open, i)?,
                    column(&quote.high, i)?,
                    column(&quote.low, i)?,
                    column(&quote.close, i)?,
                    column(&quote.volume, i).unwrap_or(0.0),
                );
                bar.is_finite().then_some(bar)
            })
            .collect()
    }
}

/// Yahoo chart `interval` for a timeframe.
fn interval(timeframe: Timeframe) -> Result<&'static str, DataError> {
    match timeframe {
        Timeframe::Minute1 => Ok("1m"),
        Timeframe::Minute5 => Ok("5m"),
        Timeframe::Minute15 => Ok("15m"),
        Timeframe::Minute30 => Ok("30m"),
        Timeframe::Hour1 => Ok("60m"),
        Timeframe::Daily => Ok("1d"),
        Timeframe::Weekly => Ok("1wk"),
        Timeframe::Monthly => Ok("1mo"),
        Timeframe::Hour4 => Err(DataError::InvalidTimeframe(format!(
            "{} is not offered by Yahoo Finance",
            timeframe
        ))),
    }
}

/// Yahoo Finance market data client (no credentials).
pub struct YahooDataClient {
    base_url: String,
    client: Client,
}

impl YahooDataClient {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_YAHOO_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = Client::builder()
            .default_headers(header::HeaderMap::from_iter([(
                header::USER_AGENT,
                header::HeaderValue::from_static(USER_AGENT),
            )]))
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl MarketData for YahooDataClient {
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            request.symbol
        );

        let (start, end, keep_last) = match request.range {
            BarRange::Between { start, end } => (start, end, None),
            BarRange::Latest { limit } => {
                // Wide enough to span weekends and holidays. Yahoo serves
                // minute bars for the last 7 days only.
                let floor = if request.timeframe.is_intraday() {
                    Duration::days(5)
                } else {
                    Duration::days(14)
                };
                let span =
                    Duration::seconds(request.timeframe.as_secs() as i64 * limit as i64 * 2);
                let end = Utc::now();
                (end - span.max(floor), end, Some(limit))
            }
        };

        let params = [
            ("period1", start.timestamp().to_string()),
            ("period2", end.timestamp().to_string()),
            ("interval", interval(request.timeframe)?.to_string()),
            ("includePrePost", "false".to_string()),
            ("events", "div,splits".to_string()),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::ApiError(format!("{}: {}", status, text)));
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        if let Some(error) = data.chart.error {
            return Err(DataError::ApiError(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let mut bars: Vec<Bar> = data
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(ChartResult::into_bars)
            .unwrap_or_default();
        bars.sort_by_key(|b| b.timestamp);

        if let Some(limit) = keep_last {
            let skip = bars.len().saturating_sub(limit);
            bars.drain(..skip);
        }

        debug!(symbol = %request.symbol, bars = bars.len(), "Fetched Yahoo chart");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "yfinance"
    }
}
