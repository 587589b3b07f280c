//! Bounded trailing buffer of closing prices.

use std::collections::VecDeque;

use crate::features::FEATURE_WARMUP;

/// Trailing closes, oldest first. When full, pushing drops the oldest close.
#[derive(Debug, Clone)]
pub struct CloseWindow {
    closes: VecDeque<f64>,
    capacity: usize,
}

impl CloseWindow {
    /// Create a window holding at least [`FEATURE_WARMUP`] closes.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(FEATURE_WARMUP);
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new close, removing the oldest if at capacity.
    pub fn push(&mut self, close: f64) {
        if self.closes.len() >= self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(close);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether enough closes are buffered to compute features.
    pub fn is_warm(&self) -> bool {
        self.closes.len() >= FEATURE_WARMUP
    }

    /// Most recent close.
    pub fn last(&self) -> Option<f64> {
        self.closes.back().copied()
    }

    /// Closes as a contiguous vector, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.closes.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.closes.clear();
    }
}

impl Default for CloseWindow {
    fn default() -> Self {
        Self::with_capacity(FEATURE_WARMUP)
    }
}
