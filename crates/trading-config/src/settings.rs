//! Configuration structures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_core::error::ConfigError;
use trading_core::types::{DataSourceKind, Symbol, Timeframe};
use trading_data::{AlpacaCredentials, DEFAULT_BASE_URL, DEFAULT_DATA_URL, DEFAULT_FEED};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaConfig,
    #[serde(default)]
    pub trading: TradingSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "ml-trader".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Alpaca API configuration.
///
/// Credentials never live in the file, only the names of the environment
/// variables that hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaConfig {
    pub key_env: String,
    pub secret_env: String,
    /// Variable that may override `base_url`
    pub base_url_env: String,
    pub base_url: String,
    pub data_url: String,
    pub feed: String,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            key_env: "ALPACA_API_KEY_ID".to_string(),
            secret_env: "ALPACA_API_SECRET_KEY".to_string(),
            base_url_env: "ALPACA_BASE_URL".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            feed: DEFAULT_FEED.to_string(),
        }
    }
}

/// Trading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub source: DataSourceKind,
    pub symbol: String,
    pub poll_interval_secs: u64,
    pub starting_capital: Decimal,
    /// Units bought on every Open
    pub stake: Decimal,
    /// Commission per unit traded
    pub commission: Decimal,
    /// Slippage percentage (0.05 = 0.05%)
    pub slippage_pct: Decimal,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Alpaca,
            symbol: "NVDA".to_string(),
            poll_interval_secs: 15,
            starting_capital: dec!(100000),
            stake: dec!(1),
            commission: Decimal::ZERO,
            slippage_pct: Decimal::ZERO,
        }
    }
}

/// Historical fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Alpaca lookback in days
    pub days: u32,
    /// Alpaca bar size
    pub timeframe: String,
    /// Yahoo Finance range (daily bars)
    pub yahoo_start: NaiveDate,
    pub yahoo_end: NaiveDate,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            days: 90,
            timeframe: "1Hour".to_string(),
            yahoo_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            yahoo_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl FetchSettings {
    pub fn timeframe(&self) -> Result<Timeframe, ConfigError> {
        self.timeframe.parse().map_err(|reason| ConfigError::InvalidValue {
            field: "fetch.timeframe".into(),
            reason,
        })
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding CSV and model artifacts
    pub data_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl AppConfig {
    /// The configured symbol, normalised.
    pub fn symbol(&self) -> Result<Symbol, ConfigError> {
        Symbol::new(&self.trading.symbol).map_err(|e| invalid("trading.symbol", e.to_string()))
    }

    /// Check cross-field constraints the types cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.symbol()?;

        let trading = &self.trading;
        if trading.poll_interval_secs == 0 {
            return Err(invalid("trading.poll_interval_secs", "must be at least 1"));
        }
        if trading.starting_capital <= Decimal::ZERO {
            return Err(invalid("trading.starting_capital", "must be positive"));
        }
        if trading.stake <= Decimal::ZERO {
            return Err(invalid("trading.stake", "must be positive"));
        }
        if trading.commission < Decimal::ZERO {
            return Err(invalid("trading.commission", "must not be negative"));
        }
        if trading.slippage_pct < Decimal::ZERO {
            return Err(invalid("trading.slippage_pct", "must not be negative"));
        }

        if self.fetch.days == 0 {
            return Err(invalid("fetch.days", "must be at least 1"));
        }
        self.fetch.timeframe()?;
        if self.fetch.yahoo_start >= self.fetch.yahoo_end {
            return Err(invalid(
                "fetch.yahoo_start",
                format!(
                    "{} is not before yahoo_end {}",
                    self.fetch.yahoo_start, self.fetch.yahoo_end
                ),
            ));
        }

        match self.logging.format.to_lowercase().as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(invalid(
                    "logging.format",
                    format!("expected `pretty` or `json`, got `{}`", other),
                ))
            }
        }

        Ok(())
    }

    /// Read Alpaca credentials from the process environment.
    pub fn alpaca_credentials(&self) -> Result<AlpacaCredentials, ConfigError> {
        self.alpaca_credentials_with(|name| std::env::var(name).ok())
    }

    /// Build Alpaca credentials from `lookup`, which maps a variable name to
    /// its value.
    pub fn alpaca_credentials_with<F>(&self, lookup: F) -> Result<AlpacaCredentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv {
                    name: name.to_string(),
                    hint: "export it or add it to a .env file".to_string(),
                })
        };

        let key_id = required(&self.alpaca.key_env)?;
        let secret_key = required(&self.alpaca.secret_env)?;
        let base_url = lookup(&self.alpaca.base_url_env)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.alpaca.base_url.clone());

        Ok(AlpacaCredentials::new(key_id, secret_key)
            .with_base_url(base_url)
            .with_data_url(self.alpaca.data_url.clone())
            .with_feed(self.alpaca.feed.clone()))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
