//! Persisted model artifact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;
use trading_core::atomic::write_atomic;
use trading_core::error::ModelError;
use trading_core::traits::Classifier;
use trading_core::types::{DataSourceKind, FeatureVector, Label, Symbol};

use crate::logistic::LogisticRegression;

/// Bumped whenever the on-disk layout changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// A trained classifier plus the context it was trained in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub source: DataSourceKind,
    pub symbol: Symbol,
    /// Feature column order the model expects
    pub feature_names: Vec<String>,
    /// Number of labelled rows used in training
    pub samples: usize,
    /// Accuracy on the training rows
    pub accuracy: f64,
    pub model: LogisticRegression,
}

impl ModelArtifact {
    pub fn new(
        source: DataSourceKind,
        symbol: Symbol,
        samples: usize,
        accuracy: f64,
        model: LogisticRegression,
    ) -> Self {
        Self {
            format_version: ARTIFACT_VERSION,
            source,
            symbol,
            feature_names: FeatureVector::NAMES.iter().map(|s| s.to_string()).collect(),
            samples,
            accuracy,
            model,
        }
    }

    /// Write the artifact as JSON.
    ///
    /// The file is written next to `path` and renamed into place, so a
    /// failure never leaves a truncated artifact behind.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| ModelError::Corrupt(format!("failed to serialize model: {}", e)))?;
        write_atomic(path, &json)?;
        info!(path = %path.display(), samples = self.samples, "Saved model artifact");
        Ok(())
    }

    /// Load and validate an artifact.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ModelError::NotFound(path.display().to_string()),
            _ => ModelError::Io(e),
        })?;

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Corrupt(format!("{}: {}", path.display(), e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check the artifact matches the features this build computes.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_VERSION {
            return Err(ModelError::Corrupt(format!(
                "unsupported artifact version {} (expected {})",
                self.format_version, ARTIFACT_VERSION
            )));
        }
        let names_match = self.feature_names.len() == FeatureVector::NAMES.len()
            && self
                .feature_names
                .iter()
                .zip(FeatureVector::NAMES)
                .all(|(a, b)| a == b);
        if !names_match {
            return Err(ModelError::Corrupt(format!(
                "feature columns {:?} do not match {:?}",
                self.feature_names,
                FeatureVector::NAMES
            )));
        }
        self.model.validate()
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> Label {
        self.model.predict(features)
    }

    fn name(&self) -> &str {
        self.model.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ModelArtifact {
        ModelArtifact::new(
            DataSourceKind::YFinance,
            Symbol::new("nvda").unwrap(),
            120,
            0.55,
            LogisticRegression {
                coefficients: vec![3.5, -0.01],
                intercept: 0.2,
            },
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("trained_model.yfinance.NVDA.json");

        let original = artifact();
        original.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.symbol.as_str(), "NVDA");
        assert!(!trading_core::atomic::temp_path(&path).exists());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_load_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ModelError::Corrupt(_))
        ));
    }

    #[test]
    fn test_load_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut bad = artifact();
        bad.model.coefficients.push(1.0);
        fs::write(&path, serde_json::to_vec(&bad).unwrap()).unwrap();

        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ModelError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_load_rejects_other_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut bad = artifact();
        bad.feature_names = vec!["rsi".into(), "macd".into()];
        fs::write(&path, serde_json::to_vec(&bad).unwrap()).unwrap();

        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ModelError::Corrupt(_))
        ));
    }
}
