//! Market data clients and CSV bar storage.
//!
//! - [`AlpacaDataClient`]: Alpaca market data v2 REST API (credentials required)
//! - [`YahooDataClient`]: Yahoo Finance chart API (no credentials)
//! - [`CsvBarStore`]: the `training_data.*.csv` artifact
//! - [`fetch_history`] / [`fetch_to_csv`]: the one-shot historical download

mod alpaca;
mod csv_store;
mod history;
mod yahoo;

pub use alpaca::{AlpacaCredentials, AlpacaDataClient, DEFAULT_BASE_URL, DEFAULT_DATA_URL, DEFAULT_FEED};
pub use csv_store::{parse_timestamp, CsvBarStore, CSV_COLUMNS};
pub use history::{fetch_history, fetch_to_csv};
pub use yahoo::{YahooDataClient, DEFAULT_YAHOO_URL};
