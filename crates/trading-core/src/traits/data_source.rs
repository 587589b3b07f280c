//! Market data source trait definitions.

use crate::error::DataError;
use crate::types::{Bar, Symbol, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Which bars to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarRange {
    /// The most recent `limit` bars.
    Latest { limit: usize },
    /// All bars with `start <= timestamp <= end`.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A bar query against a market data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub range: BarRange,
}

impl BarsRequest {
    /// Request the latest `limit` bars.
    pub fn latest(symbol: Symbol, timeframe: Timeframe, limit: usize) -> Self {
        Self {
            symbol,
            timeframe,
            range: BarRange::Latest { limit },
        }
    }

    /// Request bars over a closed time range.
    pub fn between(
        symbol: Symbol,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            timeframe,
            range: BarRange::Between { start, end },
        }
    }
}

/// Trait for REST market data sources.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch bars.
    ///
    /// # Returns
    /// A vector of bars ordered from oldest to newest
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}

#[async_trait]
impl<M: MarketData + ?Sized> MarketData for Box<M> {
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
        (**self).get_bars(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
