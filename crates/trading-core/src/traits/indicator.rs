//! Indicator trait definitions.

/// Trait for batch indicators over a price series.
///
/// Output is aligned with the input: `calculate(data)[i]` is the value at
/// `data[i]`, `None` while the indicator is still warming up or when the value
/// is undefined there.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestIndicator {
        period: usize,
    }

    impl Indicator for TestIndicator {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
            // Simple trailing sum indicator for testing
            (0..data.len())
                .map(|i| {
                    if i + 1 < self.period {
                        None
                    } else {
                        Some(data[i + 1 - self.period..=i].iter().sum())
                    }
                })
                .collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_indicator_alignment() {
        let indicator = TestIndicator { period: 3 };
        let result = indicator.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 5);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(6.0)); // 1+2+3
        assert_eq!(result[4], Some(12.0));
        assert_eq!(indicator.calculate(&[1.0]), vec![None]);
        assert_eq!(indicator.period(), 3);
    }
}
