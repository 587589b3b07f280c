//! Ticker symbols and market-data source identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Ticker symbol, always non-empty and uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate a ticker.
    pub fn new(raw: &str) -> Result<Self, DataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DataError::InvalidSymbol("symbol must not be empty".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DataError::InvalidSymbol(format!(
                "symbol must not contain whitespace: {:?}",
                raw
            )));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Where historical bars (and therefore a trained model) came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// Alpaca market data (requires API credentials)
    #[default]
    Alpaca,
    /// Yahoo Finance chart API (no credentials)
    #[serde(rename = "yfinance")]
    YFinance,
}

impl DataSourceKind {
    /// Lowercase identifier used in artifact file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Alpaca => "alpaca",
            DataSourceKind::YFinance => "yfinance",
        }
    }

    /// Whether this source needs brokerage credentials.
    pub fn requires_credentials(&self) -> bool {
        matches!(self, DataSourceKind::Alpaca)
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpaca" => Ok(DataSourceKind::Alpaca),
            "yfinance" | "yahoo" => Ok(DataSourceKind::YFinance),
            other => Err(DataError::UnknownSource(other.to_string())),
        }
    }
}
