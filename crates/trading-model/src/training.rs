//! Train the direction classifier from historical bars.

use tracing::{info, warn};
use trading_core::error::ModelError;
use trading_core::types::{Bar, Label};
use trading_features::training_set;

use crate::logistic::{LogisticRegression, LogisticRegressionParams};

/// Fewest labelled rows accepted for training.
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub model: LogisticRegression,
    /// Labelled rows used
    pub samples: usize,
    /// Rows labelled `Up`
    pub positives: usize,
    /// Accuracy on the training rows
    pub accuracy: f64,
}

/// Train on bars in chronological order.
pub fn train_on_bars(
    bars: &[Bar],
    params: &LogisticRegressionParams,
) -> Result<TrainingReport, ModelError> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    train_on_closes(&closes, params)
}

/// Train on a close series in chronological order.
pub fn train_on_closes(
    closes: &[f64],
    params: &LogisticRegressionParams,
) -> Result<TrainingReport, ModelError> {
    let set = training_set(closes);
    if set.len() < MIN_TRAINING_SAMPLES {
        return Err(ModelError::InsufficientData {
            required: MIN_TRAINING_SAMPLES,
            available: set.len(),
        });
    }

    let positives = set.positives();
    if positives == 0 {
        return Err(ModelError::SingleClass(Label::Down.as_u8()));
    }
    if positives == set.len() {
        return Err(ModelError::SingleClass(Label::Up.as_u8()));
    }

    let dropped = closes.len() - set.len();
    if dropped > trading_features::FEATURE_WARMUP {
        warn!(dropped, "Dropped rows with undefined features");
    }

    let model = params.fit(&set.features, &set.labels)?;
    let accuracy = model.score(&set.features, &set.labels);

    info!(
        samples = set.len(),
        positives,
        accuracy,
        "Trained direction classifier"
    );

    Ok(TrainingReport {
        model,
        samples: set.len(),
        positives,
        accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::traits::Classifier;
    use trading_core::types::FeatureVector;

    /// Alternating up/down closes around a slow trend.
    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + i as f64 * 0.05 + if i % 2 == 0 { 20.0 } else { -20.0 })
            .collect()
    }

    #[test]
    fn test_train_learns_mean_reversion() {
        let closes = zigzag(80);
        let report = train_on_closes(&closes, &LogisticRegressionParams::default()).unwrap();

        assert_eq!(report.samples, 80 - 5);
        assert!(report.positives > 0 && report.positives < report.samples);
        assert!(report.accuracy > 0.9);

        // After a jump up, the next bar falls.
        assert_eq!(
            report.model.predict(&FeatureVector::new(0.4, 106.0)),
            Label::Down
        );
        assert_eq!(
            report.model.predict(&FeatureVector::new(-0.3, 98.0)),
            Label::Up
        );
    }

    #[test]
    fn test_train_is_reproducible() {
        let closes = zigzag(50);
        let params = LogisticRegressionParams::default();
        let a = train_on_closes(&closes, &params).unwrap();
        let b = train_on_closes(&closes, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_too_few_rows() {
        let err = train_on_closes(&zigzag(12), &LogisticRegressionParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InsufficientData {
                required: MIN_TRAINING_SAMPLES,
                available: 7
            }
        ));
    }

    #[test]
    fn test_train_single_class() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let err = train_on_closes(&rising, &LogisticRegressionParams::default()).unwrap_err();
        assert!(matches!(err, ModelError::SingleClass(1)));
    }
}
