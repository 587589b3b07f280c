//! Artifact file naming.
//!
//! Both artifacts are keyed by data source and symbol so that models trained
//! on different feeds never overwrite each other:
//! `training_data.{source}.{SYMBOL}.csv` and `trained_model.{source}.{SYMBOL}.json`.

use std::path::{Path, PathBuf};
use trading_core::error::ConfigError;
use trading_core::types::{DataSourceKind, Symbol};

/// Locations of the CSV and model artifacts under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    data_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn training_data(&self, source: DataSourceKind, symbol: &Symbol) -> PathBuf {
        self.data_dir
            .join(format!("training_data.{}.{}.csv", source, symbol))
    }

    pub fn model(&self, source: DataSourceKind, symbol: &Symbol) -> PathBuf {
        self.data_dir
            .join(format!("trained_model.{}.{}.json", source, symbol))
    }

    /// The training CSV, or an error telling the user how to produce it.
    pub fn require_training_data(
        &self,
        source: DataSourceKind,
        symbol: &Symbol,
    ) -> Result<PathBuf, ConfigError> {
        let path = self.training_data(source, symbol);
        if path.is_file() {
            return Ok(path);
        }
        Err(ConfigError::MissingArtifact {
            what: "Training data".into(),
            path: path.display().to_string(),
            hint: format!(
                "run `ml-trader fetch --source {} --symbol {}` first",
                source, symbol
            ),
        })
    }

    /// The model artifact, or an error telling the user how to produce it.
    pub fn require_model(
        &self,
        source: DataSourceKind,
        symbol: &Symbol,
    ) -> Result<PathBuf, ConfigError> {
        let path = self.model(source, symbol);
        if path.is_file() {
            return Ok(path);
        }
        Err(ConfigError::MissingArtifact {
            what: "Trained model".into(),
            path: path.display().to_string(),
            hint: format!(
                "run `ml-trader train --source {} --symbol {}` first",
                source, symbol
            ),
        })
    }
}
