//! The decision seam between new bars and orders.

use crate::types::{Action, Bar, PositionState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a strategy, carried into the session report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyState {
    pub name: String,
    /// Enough history to compute every feature
    pub is_warmed_up: bool,
    pub bars_processed: usize,
    /// Opens and closes; holds are not counted
    pub actions_emitted: usize,
    /// Latest feature values by name
    pub indicators: HashMap<String, f64>,
    pub custom: serde_json::Value,
}

/// Turns each new bar into an [`Action`].
///
/// The session calls `on_bar` once per bar, oldest first, and never repeats
/// a timestamp.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// One line for the session start log.
    fn description(&self) -> &str {
        ""
    }

    /// `position` is the account's state before this bar's action.
    fn on_bar(&mut self, bar: &Bar, position: PositionState) -> Action;

    /// Forget all history.
    fn reset(&mut self);

    fn state(&self) -> StrategyState;

    /// Bars needed before anything other than `Hold` can come out.
    fn warmup_period(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Opens on the first bar after warmup, closes on the next.
    struct Alternating {
        warmup: usize,
        seen: usize,
        emitted: usize,
    }

    impl Strategy for Alternating {
        fn name(&self) -> &str {
            "alternating"
        }

        fn on_bar(&mut self, _bar: &Bar, position: PositionState) -> Action {
            self.seen += 1;
            if self.seen < self.warmup {
                return Action::Hold;
            }
            self.emitted += 1;
            match position {
                PositionState::Flat => Action::Open,
                PositionState::Long => Action::Close,
            }
        }

        fn reset(&mut self) {
            self.seen = 0;
            self.emitted = 0;
        }

        fn state(&self) -> StrategyState {
            StrategyState {
                name: self.name().to_string(),
                is_warmed_up: self.seen >= self.warmup,
                bars_processed: self.seen,
                actions_emitted: self.emitted,
                ..Default::default()
            }
        }

        fn warmup_period(&self) -> usize {
            self.warmup
        }
    }

    #[test]
    fn test_trait_object_drives_state() {
        let mut strategy: Box<dyn Strategy> = Box::new(Alternating {
            warmup: 2,
            seen: 0,
            emitted: 0,
        });
        let bar = Bar::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap(),
            100.0,
            101.0,
            99.0,
            100.5,
            1_000.0,
        );

        assert_eq!(strategy.on_bar(&bar, PositionState::Flat), Action::Hold);
        assert_eq!(strategy.on_bar(&bar, PositionState::Flat), Action::Open);
        assert_eq!(strategy.on_bar(&bar, PositionState::Long), Action::Close);

        let state = strategy.state();
        assert!(state.is_warmed_up);
        assert_eq!(state.bars_processed, 3);
        assert_eq!(state.actions_emitted, 2);

        strategy.reset();
        assert_eq!(strategy.state().bars_processed, 0);
        assert_eq!(strategy.warmup_period(), 2);
    }
}
