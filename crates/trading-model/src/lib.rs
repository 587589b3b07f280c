//! Direction classifier: training, prediction and artifact storage.
//!
//! The model is an L2-regularised logistic regression over the two features
//! from `trading-features`, fitted with Newton iterations so that the same
//! input always yields the same parameters.

mod artifact;
mod logistic;
mod training;

pub use artifact::{ModelArtifact, ARTIFACT_VERSION};
pub use logistic::{LogisticRegression, LogisticRegressionParams};
pub use training::{train_on_bars, train_on_closes, TrainingReport, MIN_TRAINING_SAMPLES};
