//! Feature extraction for the direction classifier.

use trading_core::traits::Indicator;
use trading_core::types::{FeatureVector, Label};

use crate::moving_average::Sma;
use crate::returns::PercentChange;
use crate::window::CloseWindow;

/// Period of the moving-average feature.
pub const MA_PERIOD: usize = 5;
/// Period of the return feature.
pub const RETURN_PERIOD: usize = 1;
/// Closes needed before both features are defined.
pub const FEATURE_WARMUP: usize = MA_PERIOD;

/// Features at the last close of `closes`.
///
/// `None` during warm-up or when either feature is undefined there
/// (for example a zero previous close).
pub fn feature_at(closes: &[f64]) -> Option<FeatureVector> {
    if closes.len() < FEATURE_WARMUP {
        return None;
    }
    let return_1 = PercentChange::new(RETURN_PERIOD).trailing(closes)?;
    let moving_average_5 = Sma::new(MA_PERIOD).trailing(closes)?;
    Some(FeatureVector::new(return_1, moving_average_5))
}

/// Features for the newest close in a live window.
pub fn live_features(window: &CloseWindow) -> Option<FeatureVector> {
    if !window.is_warm() {
        return None;
    }
    feature_at(&window.to_vec())
}

/// Features for every close of a whole history, aligned with the input.
pub fn feature_series(closes: &[f64]) -> Vec<Option<FeatureVector>> {
    let returns = PercentChange::new(RETURN_PERIOD).calculate(closes);
    let averages = Sma::new(MA_PERIOD).calculate(closes);

    returns
        .into_iter()
        .zip(averages)
        .enumerate()
        .map(|(i, (r, ma))| {
            if i + 1 < FEATURE_WARMUP {
                return None;
            }
            Some(FeatureVector::new(r?, ma?))
        })
        .collect()
}

/// Supervised samples built from a close history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    /// Feature rows in chronological order
    pub features: Vec<FeatureVector>,
    /// `Up` when the following bar's return is positive
    pub labels: Vec<Label>,
    /// Index into the source closes of each row
    pub rows: Vec<usize>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Count of `Up` labels.
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|l| **l == Label::Up).count()
    }
}

/// Build labelled samples from closes.
///
/// Row `i` pairs the features at close `i` with the direction of close
/// `i + 1`. Rows without defined features and the final close (which has no
/// next bar) are dropped.
pub fn training_set(closes: &[f64]) -> TrainingSet {
    let features = feature_series(closes);
    let returns = PercentChange::new(RETURN_PERIOD).calculate(closes);

    let mut set = TrainingSet::default();
    for (i, feature) in features.into_iter().enumerate() {
        let (Some(feature), Some(Some(next_return))) = (feature, returns.get(i + 1).copied())
        else {
            continue;
        };
        set.features.push(feature);
        set.labels.push(Label::from(next_return > 0.0));
        set.rows.push(i);
    }
    set
}
