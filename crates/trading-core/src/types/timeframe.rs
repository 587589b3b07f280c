//! Timeframe definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regular-session minutes in one US equity trading day.
const SESSION_MINUTES: u64 = 390;
/// Trading days per year used for annualization.
const TRADING_DAYS: u64 = 252;

/// Timeframe for bars/candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    /// 1 minute bars
    #[serde(rename = "1Min")]
    Minute1,
    /// 5 minute bars
    #[serde(rename = "5Min")]
    Minute5,
    /// 15 minute bars
    #[serde(rename = "15Min")]
    Minute15,
    /// 30 minute bars
    #[serde(rename = "30Min")]
    Minute30,
    /// 1 hour bars
    #[serde(rename = "1Hour")]
    #[default]
    Hour1,
    /// 4 hour bars
    #[serde(rename = "4Hour")]
    Hour4,
    /// Daily bars
    #[serde(rename = "1Day")]
    Daily,
    /// Weekly bars
    #[serde(rename = "1Week")]
    Weekly,
    /// Monthly bars
    #[serde(rename = "1Month")]
    Monthly,
}

impl Timeframe {
    /// Get the duration of the timeframe in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Minute30 => 1800,
            Timeframe::Hour1 => 3600,
            Timeframe::Hour4 => 14400,
            Timeframe::Daily => 86400,
            Timeframe::Weekly => 604800,
            Timeframe::Monthly => 2592000, // Approximate (30 days)
        }
    }

    /// Alpaca `timeframe` query value.
    pub fn as_alpaca(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1Min",
            Timeframe::Minute5 => "5Min",
            Timeframe::Minute15 => "15Min",
            Timeframe::Minute30 => "30Min",
            Timeframe::Hour1 => "1Hour",
            Timeframe::Hour4 => "4Hour",
            Timeframe::Daily => "1Day",
            Timeframe::Weekly => "1Week",
            Timeframe::Monthly => "1Month",
        }
    }

    /// Number of bars in a trading year, for annualizing per-bar returns.
    pub fn periods_per_year(&self) -> f64 {
        let per_day = match self {
            Timeframe::Minute1 => SESSION_MINUTES,
            Timeframe::Minute5 => SESSION_MINUTES / 5,
            Timeframe::Minute15 => SESSION_MINUTES / 15,
            Timeframe::Minute30 => SESSION_MINUTES / 30,
            Timeframe::Hour1 => 7,
            Timeframe::Hour4 => 2,
            Timeframe::Daily => 1,
            Timeframe::Weekly => return 52.0,
            Timeframe::Monthly => return 12.0,
        };
        (per_day * TRADING_DAYS) as f64
    }

    /// Check if this is an intraday timeframe.
    pub fn is_intraday(&self) -> bool {
        self.as_secs() < Timeframe::Daily.as_secs()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_alpaca())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" is the only case-sensitive spelling (month vs minute).
        if s == "1M" {
            return Ok(Timeframe::Monthly);
        }
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "1hour" | "hour" => Ok(Timeframe::Hour1),
            "4h" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "1day" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "1week" | "week" | "weekly" => Ok(Timeframe::Weekly),
            "1month" | "month" | "monthly" => Ok(Timeframe::Monthly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}
