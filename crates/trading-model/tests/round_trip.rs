//! Fetched history -> CSV -> training -> artifact -> prediction.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use trading_core::error::DataError;
use trading_core::traits::{BarsRequest, Classifier, MarketData};
use trading_core::types::{Bar, DataSourceKind, Symbol, Timeframe};
use trading_data::{fetch_to_csv, CsvBarStore};
use trading_features::feature_series;
use trading_model::{train_on_bars, LogisticRegressionParams, ModelArtifact};

fn synthetic_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.9).sin() * 4.0 + (i as f64 * 0.13).cos() * 2.0;
            Bar::new(
                start + Duration::hours(i as i64),
                close - 0.2,
                close + 0.5,
                close - 0.5,
                close,
                1_000.0 + i as f64,
            )
        })
        .collect()
}

/// Serves a fixed history newest first, with every tenth bar repeated and
/// one bar carrying a NaN close.
struct Unsorted(Vec<Bar>);

impl Unsorted {
    fn new(bars: &[Bar]) -> Self {
        let mut raw = Vec::new();
        for (i, bar) in bars.iter().enumerate().rev() {
            raw.push(*bar);
            if i % 10 == 0 {
                raw.push(*bar);
            }
        }
        let mut broken = bars[0];
        broken.timestamp -= Duration::hours(1);
        broken.close = f64::NAN;
        raw.push(broken);
        Self(raw)
    }
}

#[async_trait]
impl MarketData for Unsorted {
    async fn get_bars(&self, _request: &BarsRequest) -> Result<Vec<Bar>, DataError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "unsorted"
    }
}

#[tokio::test]
async fn fetched_history_trains_the_same_model_twice() {
    let bars = synthetic_bars(200);
    let source = Unsorted::new(&bars);
    let request = BarsRequest::between(
        Symbol::new("NVDA").unwrap(),
        Timeframe::Hour1,
        bars[0].timestamp - Duration::days(1),
        bars[bars.len() - 1].timestamp,
    );

    let dir = tempfile::tempdir().unwrap();
    let first_store = CsvBarStore::new(dir.path().join("first.csv"));
    let second_store = CsvBarStore::new(dir.path().join("second.csv"));
    assert_eq!(fetch_to_csv(&source, &request, &first_store).await.unwrap(), 200);
    assert_eq!(fetch_to_csv(&source, &request, &second_store).await.unwrap(), 200);

    let stored = first_store.load().unwrap();
    assert!(stored.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(stored[0].timestamp, bars[0].timestamp);

    let params = LogisticRegressionParams::default();
    let first = train_on_bars(&stored, &params).unwrap();
    let second = train_on_bars(&second_store.load().unwrap(), &params).unwrap();

    assert_eq!(first.model, second.model);
    assert_eq!(first.accuracy, second.accuracy);
    assert_eq!(first.samples, 200 - 5);
}

#[test]
fn stored_history_trains_the_same_model_twice() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path().join("training_data.alpaca.NVDA.csv"));
    let bars = synthetic_bars(200);
    store.save(&bars).unwrap();

    let params = LogisticRegressionParams::default();
    let first = train_on_bars(&store.load().unwrap(), &params).unwrap();
    let second = train_on_bars(&store.load().unwrap(), &params).unwrap();

    assert_eq!(first.model, second.model);
    assert_eq!(first.samples, 200 - 5);
    assert_eq!(first.accuracy, second.accuracy);
}

#[test]
fn saved_artifact_predicts_like_the_trained_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path().join("training_data.yfinance.NVDA.csv"));
    store.save(&synthetic_bars(120)).unwrap();

    let bars = store.load().unwrap();
    let report = train_on_bars(&bars, &LogisticRegressionParams::default()).unwrap();

    let path = dir.path().join("trained_model.yfinance.NVDA.json");
    ModelArtifact::new(
        DataSourceKind::YFinance,
        Symbol::new("NVDA").unwrap(),
        report.samples,
        report.accuracy,
        report.model.clone(),
    )
    .save(&path)
    .unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    for features in feature_series(&closes).into_iter().flatten() {
        assert_eq!(loaded.predict(&features), report.model.predict(&features));
    }
}
