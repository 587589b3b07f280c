//! Core traits for the trading system.

mod broker;
mod classifier;
mod data_source;
mod indicator;
mod strategy;

pub use broker::Broker;
pub use classifier::Classifier;
pub use data_source::{BarRange, BarsRequest, MarketData};
pub use indicator::Indicator;
pub use strategy::{Strategy, StrategyState};
