//! Sliding windows over a scaled series.

use std::collections::VecDeque;

/// Supervised pairs `(scaled[i - lookback..i], scaled[i])` for
/// `i in lookback..len`.
pub fn training_pairs(scaled: &[f64], lookback: usize) -> Vec<(&[f64], f64)> {
    if lookback == 0 || scaled.len() <= lookback {
        return Vec::new();
    }
    (lookback..scaled.len())
        .map(|i| (&scaled[i - lookback..i], scaled[i]))
        .collect()
}

/// Fixed-size buffer of the most recent values used to drive the
/// autoregressive rollout. Pushing evicts the oldest value.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RolloutWindow {
    /// Seeds the window with the last `capacity` values of `history`.
    ///
    /// `None` if `history` is shorter than `capacity` or `capacity` is zero.
    pub fn from_tail(history: &[f64], capacity: usize) -> Option<Self> {
        if capacity == 0 || history.len() < capacity {
            return None;
        }
        Some(Self {
            values: history[history.len() - capacity..].iter().copied().collect(),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `value` and returns the evicted oldest value.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    /// Contents, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_cover_every_target_once() {
        let scaled = [0.0, 0.1, 0.2, 0.3, 0.4];
        let pairs = training_pairs(&scaled, 3);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (&scaled[0..3], 0.3));
        assert_eq!(pairs[1], (&scaled[1..4], 0.4));
    }

    #[test]
    fn no_pairs_when_too_short() {
        assert!(training_pairs(&[0.0, 1.0], 2).is_empty());
        assert!(training_pairs(&[0.0, 1.0], 0).is_empty());
    }

    #[test]
    fn rollout_window_evicts_oldest() {
        let mut w = RolloutWindow::from_tail(&[1.0, 2.0, 3.0, 4.0], 3).unwrap();
        assert_eq!(w.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.push(5.0), Some(2.0));
        assert_eq!(w.to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(w.capacity(), 3);
    }

    #[test]
    fn rollout_window_needs_enough_history() {
        assert!(RolloutWindow::from_tail(&[1.0], 2).is_none());
        assert!(RolloutWindow::from_tail(&[1.0], 0).is_none());
    }
}
