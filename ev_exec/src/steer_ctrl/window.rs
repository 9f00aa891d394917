//! Fixed capacity sliding window sum

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Ring buffer of the most recent values with a running sum.
#[derive(Debug, Clone, Serialize)]
pub struct SlidingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    sum: f64,

    /// Pushes since the sum was last recomputed from the contents
    since_rebuild: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SlidingWindow {
    /// Create an empty window. Returns `None` if `capacity` is zero.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }

        Some(Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            sum: 0.0,
            since_rebuild: 0,
        })
    }

    /// Add a value, evicting the oldest if the window is full. Amortised O(1).
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;

        // Recompute once per window length so rounding errors cannot build up
        self.since_rebuild += 1;
        if self.since_rebuild >= self.capacity {
            self.sum = self.values.iter().sum();
            self.since_rebuild = 0;
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.since_rebuild = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity() {
        assert!(SlidingWindow::new(0).is_none());
    }

    #[test]
    fn test_evicts_oldest() {
        let mut window = SlidingWindow::new(3).unwrap();

        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.sum(), 3.0);
        assert_eq!(window.len(), 2);

        window.push(3.0);
        window.push(4.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 9.0);

        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.sum(), 0.0);
    }

    #[test]
    fn test_sum_matches_contents() {
        let mut window = SlidingWindow::new(50).unwrap();
        for i in 0..10_000 {
            window.push(((i * 37) % 101) as f64 * 0.013 - 0.6);
        }
        let expected: f64 = (9_950..10_000)
            .map(|i| ((i * 37) % 101) as f64 * 0.013 - 0.6)
            .sum();
        assert!((window.sum() - expected).abs() < 1e-9);
    }
}
