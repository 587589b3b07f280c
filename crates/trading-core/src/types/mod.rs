//! Core data types for the trading system.

mod bar;
mod market;
mod order;
mod position;
mod prediction;
mod timeframe;

pub use bar::Bar;
pub use market::{DataSourceKind, Symbol};
pub use order::{Fill, Order, OrderRequest, OrderStatus, Side};
pub use position::{Portfolio, Position};
pub use prediction::{Action, FeatureVector, Label, PositionState, FEATURE_COUNT};
pub use timeframe::Timeframe;
