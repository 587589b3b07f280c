//! Alpaca market data v2 client.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client};
use serde::Deserialize;
use std::fmt;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::{BarRange, BarsRequest, MarketData};
use trading_core::types::Bar;

pub const DEFAULT_BASE_URL: &str = "https://paper-api.alpaca.markets";
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_FEED: &str = "iex";

/// Largest page Alpaca serves per bars request.
const PAGE_LIMIT: usize = 10_000;

/// Alpaca API credentials and endpoints.
///
/// Built once at startup and moved into the client that uses it.
#[derive(Clone)]
pub struct AlpacaCredentials {
    pub key_id: String,
    pub secret_key: String,
    /// Trading API endpoint (paper or live)
    pub base_url: String,
    /// Market data endpoint
    pub data_url: String,
    /// Data feed (`iex` or `sip`)
    pub feed: String,
}

impl AlpacaCredentials {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret_key: secret_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            feed: DEFAULT_FEED.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into();
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }

    /// Whether the trading endpoint is Alpaca's paper environment.
    pub fn is_paper(&self) -> bool {
        self.base_url.contains("paper-api")
    }
}

// Keep secrets out of logs.
impl fmt::Debug for AlpacaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaCredentials")
            .field("key_id", &mask(&self.key_id))
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .field("data_url", &self.data_url)
            .field("feed", &self.feed)
            .finish()
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{}***", visible)
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    // `null` when the range holds no bars
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl AlpacaBar {
    fn into_bar(self) -> Result<Bar, DataError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.t)
            .map_err(|e| DataError::ParseError(format!("bar timestamp {:?}: {}", self.t, e)))?
            .with_timezone(&Utc);
        Ok(Bar::new(timestamp, self.o, self.h, self.l, self.c, self.v))
    }
}

/// Alpaca market data client.
pub struct AlpacaDataClient {
    credentials: AlpacaCredentials,
    client: Client,
}

impl AlpacaDataClient {
    /// Create a client with the auth headers baked in.
    pub fn new(credentials: AlpacaCredentials) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&credentials.key_id)
                .map_err(|e| DataError::ConnectionError(format!("invalid key id: {}", e)))?,
        );
        let mut secret = header::HeaderValue::from_str(&credentials.secret_key)
            .map_err(|e| DataError::ConnectionError(format!("invalid secret key: {}", e)))?;
        secret.set_sensitive(true);
        headers.insert("APCA-API-SECRET-KEY", secret);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self {
            credentials,
            client,
        })
    }

    pub fn credentials(&self) -> &AlpacaCredentials {
        &self.credentials
    }

    async fn fetch_page(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<AlpacaBarsResponse, DataError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::ApiError(format!("{}: {}", status, text)));
        }

        resp.json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MarketData for AlpacaDataClient {
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
        let url = format!(
            "{}/v2/stocks/{}/bars",
            self.credentials.data_url.trim_end_matches('/'),
            request.symbol
        );
        let mut params = vec![
            ("timeframe", request.timeframe.as_alpaca().to_string()),
            ("feed", self.credentials.feed.clone()),
        ];

        match request.range {
            BarRange::Latest { limit } => {
                params.push(("limit", limit.to_string()));
                params.push(("sort", "desc".to_string()));

                let page = self.fetch_page(&url, &params).await?;
                let mut bars = page
                    .bars
                    .unwrap_or_default()
                    .into_iter()
                    .map(AlpacaBar::into_bar)
                    .collect::<Result<Vec<_>, _>>()?;
                bars.reverse();
                Ok(bars)
            }
            BarRange::Between { start, end } => {
                params.push(("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)));
                params.push(("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)));
                params.push(("limit", PAGE_LIMIT.to_string()));
                params.push(("sort", "asc".to_string()));

                let mut bars = Vec::new();
                let mut page_token: Option<String> = None;
                loop {
                    let mut page_params = params.clone();
                    if let Some(token) = &page_token {
                        page_params.push(("page_token", token.clone()));
                    }

                    let page = self.fetch_page(&url, &page_params).await?;
                    for bar in page.bars.unwrap_or_default() {
                        bars.push(bar.into_bar()?);
                    }
                    debug!(symbol = %request.symbol, bars = bars.len(), "Fetched Alpaca page");

                    match page.next_page_token {
                        Some(token) if !token.is_empty() => page_token = Some(token),
                        _ => break,
                    }
                }
                Ok(bars)
            }
        }
    }

    fn name(&self) -> &str {
        "alpaca"
    }
}
