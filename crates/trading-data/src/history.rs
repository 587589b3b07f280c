//! One-shot historical download into the CSV store.

use tracing::{info, warn};
use trading_core::error::DataError;
use trading_core::traits::{BarsRequest, MarketData};
use trading_core::types::Bar;

use crate::csv_store::CsvBarStore;

/// Fetch bars and normalise them: finite values only, ascending, one bar per
/// timestamp. An empty result is an error.
pub async fn fetch_history<M>(source: &M, request: &BarsRequest) -> Result<Vec<Bar>, DataError>
where
    M: MarketData + ?Sized,
{
    let raw = source.get_bars(request).await?;
    let fetched = raw.len();

    let mut bars: Vec<Bar> = raw.into_iter().filter(Bar::is_finite).collect();
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    if bars.len() < fetched {
        warn!(
            dropped = fetched - bars.len(),
            "Dropped non-finite or duplicate bars"
        );
    }
    if bars.is_empty() {
        return Err(DataError::NoDataAvailable);
    }

    info!(
        source = source.name(),
        symbol = %request.symbol,
        timeframe = %request.timeframe,
        bars = bars.len(),
        first = %bars[0].timestamp,
        last = %bars[bars.len() - 1].timestamp,
        "Fetched historical bars"
    );
    Ok(bars)
}

/// Fetch history and replace the CSV file with it.
///
/// Nothing is written when the fetch fails or returns no bars.
pub async fn fetch_to_csv<M>(
    source: &M,
    request: &BarsRequest,
    store: &CsvBarStore,
) -> Result<usize, DataError>
where
    M: MarketData + ?Sized,
{
    let bars = fetch_history(source, request).await?;
    store.save(&bars)?;
    Ok(bars.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use trading_core::types::{Symbol, Timeframe};

    struct Fixed(Vec<Bar>);

    #[async_trait]
    impl MarketData for Fixed {
        async fn get_bars(&self, _request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn bar(day: u32, close: f64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Bar::new(ts, close, close, close, close, 10.0)
    }

    fn request() -> BarsRequest {
        BarsRequest::between(
            Symbol::new("NVDA").unwrap(),
            Timeframe::Daily,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_history_normalises() {
        let source = Fixed(vec![bar(3, 3.0), bar(1, 1.0), bar(3, 3.0), bar(2, f64::NAN)]);
        let bars = fetch_history(&source, &request()).await.unwrap();
        assert_eq!(bars.iter().map(|b| b.close).collect::<Vec<_>>(), vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn test_empty_fetch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvBarStore::new(dir.path().join("training_data.fixed.NVDA.csv"));

        let result = fetch_to_csv(&Fixed(Vec::new()), &request(), &store).await;
        assert!(matches!(result, Err(DataError::NoDataAvailable)));
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_fetch_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvBarStore::new(dir.path().join("training_data.fixed.NVDA.csv"));

        let written = fetch_to_csv(&Fixed(vec![bar(2, 2.0), bar(1, 1.0)]), &request(), &store)
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.load().unwrap()[0].close, 1.0);
    }
}
