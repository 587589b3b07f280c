//! Core types and traits for the ml-trader workspace.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Timeframe, Symbol)
//! - Model inputs and outputs (FeatureVector, Label) and trading actions
//! - Order and position bookkeeping types for the paper broker
//! - Core traits for market data, classifiers, strategies, indicators and brokers

pub mod types;
pub mod traits;
pub mod error;
pub mod atomic;

pub use error::TradingError;
pub use types::*;
pub use traits::*;
