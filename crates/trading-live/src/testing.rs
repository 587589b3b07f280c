//! Scripted market data for tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use trading_core::error::DataError;
use trading_core::traits::{BarsRequest, MarketData};
use trading_core::types::Bar;

/// Serves one scripted response per request, then empty results.
pub(crate) struct Scripted {
    responses: Mutex<VecDeque<Result<Vec<Bar>, DataError>>>,
    pub(crate) requests: Mutex<Vec<BarsRequest>>,
}

impl Scripted {
    pub(crate) fn new(responses: Vec<Result<Vec<Bar>, DataError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// One new bar per request, one minute apart.
    pub(crate) fn closes(closes: &[f64]) -> Self {
        Self::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Ok(vec![bar(i as u32, c)]))
                .collect(),
        )
    }
}

#[async_trait]
impl MarketData for Scripted {
    async fn get_bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap() + Duration::minutes(minute as i64)
}

pub(crate) fn bar(minute: u32, close: f64) -> Bar {
    Bar::new(at(minute), close, close, close, close, 100.0)
}
