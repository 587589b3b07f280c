//! Live bar poller.
//!
//! Each cycle asks the data source for the latest one-minute bars and
//! surfaces the newest one only if it is strictly newer than anything
//! surfaced before. Fetch failures are logged and treated as "no new data".

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};
use trading_core::error::ConfigError;
use trading_core::traits::{BarsRequest, MarketData};
use trading_core::types::{Bar, Symbol, Timeframe};

/// Bars requested per cycle.
pub const LATEST_LIMIT: usize = 2;

/// Deduplication state: the newest timestamp surfaced so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollState {
    last_seen: Option<DateTime<Utc>>,
}

impl PollState {
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Whether `bar` is strictly newer than every bar surfaced so far.
    pub fn is_new(&self, bar: &Bar) -> bool {
        match self.last_seen {
            Some(seen) => bar.is_newer_than(seen),
            None => true,
        }
    }

    /// Record `bar` if it is new. Never moves backwards.
    fn observe(&mut self, bar: &Bar) -> bool {
        if self.is_new(bar) {
            self.last_seen = Some(bar.timestamp);
            true
        } else {
            false
        }
    }
}

/// Where the poller is in its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollPhase {
    /// No bar surfaced by the last cycle
    #[default]
    AwaitingData,
    /// The last cycle surfaced a bar
    Emitting,
}

/// Why a cycle produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    /// The request failed (already logged)
    FetchFailed,
    /// The source returned no bars
    Empty,
    /// The latest bar was not newer than the last one surfaced
    Stale,
}

/// Result of one fetch/compare cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    NewBar(Bar),
    NoNewData(NoDataReason),
}

impl PollOutcome {
    pub fn into_bar(self) -> Option<Bar> {
        match self {
            PollOutcome::NewBar(bar) => Some(bar),
            PollOutcome::NoNewData(_) => None,
        }
    }
}

/// Polls a market data source for new one-minute bars of one symbol.
pub struct LiveBarPoller<S> {
    source: S,
    request: BarsRequest,
    interval: Duration,
    state: PollState,
    phase: PollPhase,
    cycles: u64,
    failures: u64,
}

impl<S: MarketData> LiveBarPoller<S> {
    /// Create a poller. The interval must be at least one second.
    pub fn new(source: S, symbol: Symbol, interval: Duration) -> Result<Self, ConfigError> {
        if interval.as_secs() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(Self {
            source,
            request: BarsRequest::latest(symbol, Timeframe::Minute1, LATEST_LIMIT),
            interval,
            state: PollState::default(),
            phase: PollPhase::AwaitingData,
            cycles: 0,
            failures: 0,
        })
    }

    /// Run one fetch/compare cycle without waiting.
    pub async fn tick(&mut self) -> PollOutcome {
        self.cycles += 1;
        self.phase = PollPhase::AwaitingData;

        let bars = match self.source.get_bars(&self.request).await {
            Ok(bars) => bars,
            Err(e) => {
                self.failures += 1;
                warn!(
                    source = self.source.name(),
                    symbol = %self.request.symbol,
                    error = %e,
                    "Bar fetch failed; skipping cycle"
                );
                return PollOutcome::NoNewData(NoDataReason::FetchFailed);
            }
        };

        let Some(latest) = bars.iter().max_by_key(|b| b.timestamp).copied() else {
            debug!(symbol = %self.request.symbol, "No bars returned");
            return PollOutcome::NoNewData(NoDataReason::Empty);
        };

        if self.state.observe(&latest) {
            self.phase = PollPhase::Emitting;
            debug!(symbol = %self.request.symbol, timestamp = %latest.timestamp, close = latest.close, "New bar");
            PollOutcome::NewBar(latest)
        } else {
            debug!(
                symbol = %self.request.symbol,
                timestamp = %latest.timestamp,
                "Latest bar already seen"
            );
            PollOutcome::NoNewData(NoDataReason::Stale)
        }
    }

    /// Run one cycle; when it yields nothing, sleep for the poll interval.
    pub async fn poll(&mut self) -> Option<Bar> {
        let bar = self.tick().await.into_bar();
        if bar.is_none() {
            tokio::time::sleep(self.interval).await;
        }
        bar
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.state.last_seen()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn symbol(&self) -> &Symbol {
        &self.request.symbol
    }

    /// Cycles run and how many of them failed to fetch.
    pub fn counters(&self) -> (u64, u64) {
        (self.cycles, self.failures)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
