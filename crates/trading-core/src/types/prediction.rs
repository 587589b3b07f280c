//! Classifier inputs/outputs and the trading actions derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features fed to the classifier.
pub const FEATURE_COUNT: usize = 2;

/// Classifier input derived from the trailing closes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Percentage change between the two most recent closes (fraction, not %)
    pub return_1: f64,
    /// Arithmetic mean of the 5 most recent closes
    pub moving_average_5: f64,
}

impl FeatureVector {
    /// Feature names in model column order.
    pub const NAMES: [&'static str; FEATURE_COUNT] = ["return_1", "moving_average_5"];

    pub fn new(return_1: f64, moving_average_5: f64) -> Self {
        Self {
            return_1,
            moving_average_5,
        }
    }

    /// Values in model column order.
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.return_1, self.moving_average_5]
    }
}

/// Binary classifier output: will the next bar close higher?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    /// 0: next close not higher
    Down,
    /// 1: next close higher
    Up,
}

impl Label {
    pub fn as_u8(&self) -> u8 {
        match self {
            Label::Down => 0,
            Label::Up => 1,
        }
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.as_u8())
    }
}

impl From<bool> for Label {
    fn from(up: bool) -> Self {
        if up {
            Label::Up
        } else {
            Label::Down
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Down),
            1 => Ok(Label::Up),
            other => Err(format!("label must be 0 or 1, got {}", other)),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Whether the account currently holds the traded instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }
}

/// Decision produced for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Buy one unit
    Open,
    /// Sell the held unit
    Close,
    /// Do nothing
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Open => write!(f, "OPEN"),
            Action::Close => write!(f, "CLOSE"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_conversions() {
        assert_eq!(Label::from(true), Label::Up);
        assert_eq!(Label::from(false), Label::Down);
        assert_eq!(Label::try_from(1u8).unwrap(), Label::Up);
        assert!(Label::try_from(2u8).is_err());
        assert_eq!(Label::Up.as_f64(), 1.0);
    }

    #[test]
    fn test_feature_vector_order() {
        let fv = FeatureVector::new(0.05, 101.0);
        assert_eq!(fv.as_array(), [0.05, 101.0]);
        assert_eq!(FeatureVector::NAMES[0], "return_1");
    }
}
