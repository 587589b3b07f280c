//! Prediction-driven trading strategy.
//!
//! [`decide`] is the pure decision rule: features from the trailing closes,
//! a label from the classifier, then the position policy. [`MlStrategy`]
//! wraps it with a bounded close window for bar-by-bar use.

mod ml_strategy;

pub use ml_strategy::{decide, policy, Decision, MlStrategy, MlStrategyConfig};
