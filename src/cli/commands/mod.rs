//! CLI command implementations.

pub mod fetch;
pub mod trade;
pub mod train;
pub mod validate;

use anyhow::{Context, Result};
use trading_config::{AppConfig, ArtifactPaths};
use trading_core::types::{DataSourceKind, Symbol};

use crate::cli::TargetArgs;

/// Source, symbol and artifact locations after applying CLI overrides.
pub struct Target {
    pub source: DataSourceKind,
    pub symbol: Symbol,
    pub paths: ArtifactPaths,
}

impl TargetArgs {
    pub fn resolve(&self, config: &AppConfig) -> Result<Target> {
        let source = match &self.source {
            Some(raw) => raw.parse().context("Invalid --source")?,
            None => config.trading.source,
        };
        let symbol = match &self.symbol {
            Some(raw) => Symbol::new(raw).context("Invalid --symbol")?,
            None => config.symbol()?,
        };
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.paths.data_dir.clone());

        Ok(Target {
            source,
            symbol,
            paths: ArtifactPaths::new(data_dir),
        })
    }
}
