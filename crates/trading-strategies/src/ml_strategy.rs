//! Classifier-driven long/flat strategy.
//!
//! Opens a position when the model predicts the next bar closes higher and
//! closes it when the model predicts it will not.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use trading_core::{
    error::StrategyError,
    traits::{Classifier, Strategy, StrategyState},
    types::{Action, Bar, FeatureVector, Label, PositionState},
};
use trading_features::{feature_at, live_features, CloseWindow, FEATURE_WARMUP};
use trading_model::ModelArtifact;

/// Map a prediction and the current position to an action.
pub fn policy(position: PositionState, label: Label) -> Action {
    match (position, label) {
        (PositionState::Flat, Label::Up) => Action::Open,
        (PositionState::Long, Label::Down) => Action::Close,
        (PositionState::Flat, Label::Down) | (PositionState::Long, Label::Up) => Action::Hold,
    }
}

/// Everything a single decision looked at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// `None` during warm-up or when a feature is undefined
    pub features: Option<FeatureVector>,
    /// `None` when the model was not consulted
    pub label: Option<Label>,
    pub action: Action,
}

impl Decision {
    fn evaluate(
        features: Option<FeatureVector>,
        position: PositionState,
        model: &dyn Classifier,
    ) -> Self {
        match features {
            Some(features) => {
                let label = model.predict(&features);
                Self {
                    features: Some(features),
                    label: Some(label),
                    action: policy(position, label),
                }
            }
            None => Self {
                features: None,
                label: None,
                action: Action::Hold,
            },
        }
    }
}

/// Decide what to do given the trailing closes (oldest first).
///
/// Holds with fewer than five closes or when a feature is undefined at the
/// newest close. Same inputs always give the same action.
pub fn decide(closes: &[f64], position: PositionState, model: &dyn Classifier) -> Action {
    Decision::evaluate(feature_at(closes), position, model).action
}

/// Configuration for the ML strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlStrategyConfig {
    /// Closes kept in the trailing window
    pub window: usize,
}

impl Default for MlStrategyConfig {
    fn default() -> Self {
        Self {
            window: FEATURE_WARMUP,
        }
    }
}

impl MlStrategyConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.window < FEATURE_WARMUP {
            return Err(StrategyError::InvalidConfig(format!(
                "window must hold at least {} closes, got {}",
                FEATURE_WARMUP, self.window
            )));
        }
        Ok(())
    }
}

/// Bar-by-bar wrapper around [`decide`].
pub struct MlStrategy {
    config: MlStrategyConfig,
    model: Box<dyn Classifier>,
    window: CloseWindow,
    last: Option<Decision>,
    bars_processed: usize,
    actions_emitted: usize,
}

impl MlStrategy {
    /// Create a strategy around an already loaded model.
    pub fn new(config: MlStrategyConfig, model: Box<dyn Classifier>) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            window: CloseWindow::with_capacity(config.window),
            config,
            model,
            last: None,
            bars_processed: 0,
            actions_emitted: 0,
        })
    }

    /// Load the model artifact once and build the strategy around it.
    pub fn from_artifact(config: MlStrategyConfig, path: &Path) -> Result<Self, StrategyError> {
        let artifact = ModelArtifact::load(path).map_err(|e| {
            StrategyError::InitializationFailed(format!(
                "could not load model from {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(
            path = %path.display(),
            symbol = %artifact.symbol,
            source = %artifact.source,
            samples = artifact.samples,
            accuracy = artifact.accuracy,
            "Loaded model"
        );
        Self::new(config, Box::new(artifact))
    }

    /// The most recent decision, if any bar has been seen.
    pub fn last_decision(&self) -> Option<&Decision> {
        self.last.as_ref()
    }

    pub fn config(&self) -> &MlStrategyConfig {
        &self.config
    }
}

impl Strategy for MlStrategy {
    fn name(&self) -> &str {
        "ML Direction"
    }

    fn description(&self) -> &str {
        "Long when the classifier predicts the next close is higher, flat otherwise"
    }

    fn on_bar(&mut self, bar: &Bar, position: PositionState) -> Action {
        self.bars_processed += 1;
        self.window.push(bar.close);

        let decision = Decision::evaluate(live_features(&self.window), position, &*self.model);
        if decision.action != Action::Hold {
            self.actions_emitted += 1;
        }

        debug!(
            timestamp = %bar.timestamp,
            close = bar.close,
            position = ?position,
            label = ?decision.label,
            action = %decision.action,
            "Strategy decision"
        );

        self.last = Some(decision);
        decision.action
    }

    fn reset(&mut self) {
        self.window.clear();
        self.last = None;
        self.bars_processed = 0;
        self.actions_emitted = 0;
    }

    fn state(&self) -> StrategyState {
        let features = self.last.and_then(|d| d.features);
        StrategyState {
            name: self.name().to_string(),
            is_warmed_up: self.window.is_warm(),
            bars_processed: self.bars_processed,
            actions_emitted: self.actions_emitted,
            indicators: features
                .map(|f| {
                    FeatureVector::NAMES
                        .iter()
                        .map(|n| n.to_string())
                        .zip(f.as_array())
                        .collect()
                })
                .unwrap_or_default(),
            custom: serde_json::json!({
                "model": self.model.name(),
                "window": self.config.window,
                "last_label": self.last.and_then(|d| d.label).map(|l| l.as_u8()),
            }),
        }
    }

    fn warmup_period(&self) -> usize {
        FEATURE_WARMUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// Always predicts the same label and remembers what it was shown.
    struct Fixed {
        label: Label,
        seen: Mutex<Vec<FeatureVector>>,
    }

    impl Fixed {
        fn new(label: Label) -> Self {
            Self {
                label,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for Fixed {
        fn predict(&self, features: &FeatureVector) -> Label {
            self.seen.lock().unwrap().push(*features);
            self.label
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Up when the last return was negative.
    struct Contrarian;

    impl Classifier for Contrarian {
        fn predict(&self, features: &FeatureVector) -> Label {
            Label::from(features.return_1 < 0.0)
        }

        fn name(&self) -> &str {
            "contrarian"
        }
    }

    const CLOSES: [f64; 5] = [10.0, 11.0, 9.0, 12.0, 13.0];

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + Duration::minutes(i as i64), c, c, c, c, 100.0))
            .collect()
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(policy(PositionState::Flat, Label::Up), Action::Open);
        assert_eq!(policy(PositionState::Flat, Label::Down), Action::Hold);
        assert_eq!(policy(PositionState::Long, Label::Down), Action::Close);
        assert_eq!(policy(PositionState::Long, Label::Up), Action::Hold);
    }

    #[test]
    fn test_reference_window_opens_when_flat() {
        let model = Fixed::new(Label::Up);
        assert_eq!(decide(&CLOSES, PositionState::Flat, &model), Action::Open);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!((seen[0].return_1 - 0.083333).abs() < 1e-6);
        assert!((seen[0].moving_average_5 - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_reference_window_closes_when_long() {
        let model = Fixed::new(Label::Down);
        assert_eq!(decide(&CLOSES, PositionState::Long, &model), Action::Close);
    }

    #[test]
    fn test_holds_during_warmup_without_consulting_model() {
        let model = Fixed::new(Label::Up);
        for n in 0..FEATURE_WARMUP {
            assert_eq!(decide(&CLOSES[..n], PositionState::Flat, &model), Action::Hold);
        }
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_holds_on_undefined_return() {
        let model = Fixed::new(Label::Up);
        let closes = [10.0, 11.0, 9.0, 0.0, 13.0];
        assert_eq!(decide(&closes, PositionState::Flat, &model), Action::Hold);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let closes = [100.0, 101.5, 99.0, 98.5, 100.25, 97.0];
        for position in [PositionState::Flat, PositionState::Long] {
            let first = decide(&closes, position, &Contrarian);
            for _ in 0..5 {
                assert_eq!(decide(&closes, position, &Contrarian), first);
            }
        }
    }

    #[test]
    fn test_strategy_matches_decide_bar_by_bar() {
        let closes = [100.0, 101.5, 99.0, 98.5, 100.25, 97.0, 98.0, 99.5, 96.0];
        let mut strategy =
            MlStrategy::new(MlStrategyConfig::default(), Box::new(Contrarian)).unwrap();

        let mut position = PositionState::Flat;
        for (i, bar) in bars(&closes).iter().enumerate() {
            let action = strategy.on_bar(bar, position);
            assert_eq!(action, decide(&closes[..=i], position, &Contrarian), "bar {}", i);
            position = match action {
                Action::Open => PositionState::Long,
                Action::Close => PositionState::Flat,
                Action::Hold => position,
            };
        }

        let state = strategy.state();
        assert!(state.is_warmed_up);
        assert_eq!(state.bars_processed, closes.len());
        assert!(state.actions_emitted > 0);
        assert!(state.indicators.contains_key("moving_average_5"));
    }

    #[test]
    fn test_strategy_reset() {
        let mut strategy =
            MlStrategy::new(MlStrategyConfig::default(), Box::new(Fixed::new(Label::Up))).unwrap();
        for bar in bars(&CLOSES) {
            strategy.on_bar(&bar, PositionState::Flat);
        }
        assert_eq!(strategy.last_decision().map(|d| d.action), Some(Action::Open));

        strategy.reset();
        assert!(strategy.last_decision().is_none());
        assert!(!strategy.state().is_warmed_up);
        assert_eq!(strategy.on_bar(&bars(&[13.0])[0], PositionState::Flat), Action::Hold);
    }

    #[test]
    fn test_config_rejects_short_window() {
        let config = MlStrategyConfig { window: 3 };
        assert!(config.validate().is_err());
        assert!(MlStrategy::new(config, Box::new(Contrarian)).is_err());
    }

    #[test]
    fn test_from_artifact_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = MlStrategy::from_artifact(
            MlStrategyConfig::default(),
            &dir.path().join("trained_model.alpaca.NVDA.json"),
        );
        assert!(matches!(result, Err(StrategyError::InitializationFailed(_))));
    }
}
