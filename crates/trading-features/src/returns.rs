//! Return indicators.

use trading_core::traits::Indicator;

/// Fractional change from `prev` to `curr`.
///
/// Undefined when `prev` is zero or either input is not finite.
#[inline]
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    let change = (curr - prev) / prev;
    change.is_finite().then_some(change)
}

/// Percentage change over `period` bars, as a fraction (0.05 = +5%).
#[derive(Debug, Clone)]
pub struct PercentChange {
    period: usize,
}

impl PercentChange {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Change between the last value and the value `period` bars earlier.
    pub fn trailing(&self, data: &[f64]) -> Option<f64> {
        let last = data.len().checked_sub(1)?;
        let base = last.checked_sub(self.period)?;
        pct_change(data[base], data[last])
    }
}

impl Indicator for PercentChange {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        (0..data.len())
            .map(|i| self.trailing(&data[..=i]))
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "PCT_CHANGE"
    }
}
