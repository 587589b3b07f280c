//! OHLCV (Open, High, Low, Close, Volume) bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price bar for a fixed interval.
/// Uses f64 for fast feature calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when every price and the volume are finite numbers.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Whether this bar is strictly newer than `other`.
    #[inline]
    pub fn is_newer_than(&self, other: DateTime<Utc>) -> bool {
        self.timestamp > other
    }
}
