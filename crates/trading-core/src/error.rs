//! Error types shared by every crate in the workspace.

use thiserror::Error;

/// Anything that can stop a live session.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Configuration errors. Always fatal before the trading loop starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not set; {hint}")]
    MissingEnv { name: String, hint: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{what} not found at {path}; {hint}")]
    MissingArtifact {
        what: String,
        path: String,
        hint: String,
    },
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy initialization failed: {0}")]
    InitializationFailed(String),
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Broker error: {0}")]
    Internal(String),
}

/// Data source and data store errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Missing required columns {missing:?} (expected {expected:?})")]
    MissingColumns {
        missing: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classifier training and artifact errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    NotFound(String),

    #[error("Model artifact is unreadable: {0}")]
    Corrupt(String),

    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Insufficient training data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Training labels contain a single class ({0}); need both up and down bars")]
    SingleClass(u8),

    #[error("Training did not converge: {0}")]
    NotConverged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
