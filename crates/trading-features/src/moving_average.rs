//! Moving average indicators.

use trading_core::traits::Indicator;

/// Arithmetic mean of a non-empty slice.
#[inline]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let value = values.iter().sum::<f64>() / values.len() as f64;
    value.is_finite().then_some(value)
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// SMA over the trailing `period` values of `data`.
    pub fn trailing(&self, data: &[f64]) -> Option<f64> {
        if data.len() < self.period {
            return None;
        }
        mean(&data[data.len() - self.period..])
    }
}

impl Indicator for Sma {
    type Output = f64;

    // Each window is summed on its own rather than with a running sum, so a
    // value computed here is bit-identical to `trailing` on the same window.
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        (0..data.len())
            .map(|i| self.trailing(&data[..=i]))
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}
