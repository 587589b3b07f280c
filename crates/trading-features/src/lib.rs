//! Model features shared by training and live inference.
//!
//! The classifier sees two features per bar:
//! - `return_1`: percentage change between the two most recent closes
//! - `moving_average_5`: simple mean of the five most recent closes
//!
//! Both the batch path (whole history, used for training) and the rolling
//! path (bounded window, used live) go through the same indicator code so the
//! values agree bar for bar.

pub mod features;
pub mod moving_average;
pub mod returns;
pub mod window;

pub use features::{
    feature_at, feature_series, live_features, training_set, TrainingSet, FEATURE_WARMUP,
};
pub use moving_average::Sma;
pub use returns::PercentChange;
pub use window::CloseWindow;
