//! Bounded sliding windows and the range alert predicate.
//!
//! A [`SlidingWindow`] keeps the most recent `capacity` values of a stream in
//! arrival order. [`evaluate`] decides, from a window snapshot alone, whether
//! the values have stayed within a threshold of each other. Nothing in this
//! module logs; callers report alerts themselves.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

/// A FIFO-evicting buffer of the most recent values.
///
/// `len() <= capacity()` holds after every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    values: VecDeque<f64>,
    capacity: NonZeroUsize,
}

impl SlidingWindow {
    /// Create an empty window holding at most `capacity` values.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a value, evicting the oldest one first if the window is full.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.is_full() {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    /// Maximum number of values kept.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of values currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the window holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if the window holds `capacity` values.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity.get()
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Smallest value in the window.
    pub fn min(&self) -> Option<f64> {
        self.iter().reduce(f64::min)
    }

    /// Largest value in the window.
    pub fn max(&self) -> Option<f64> {
        self.iter().reduce(f64::max)
    }

    /// `max - min` over the current contents, `None` when empty.
    pub fn range(&self) -> Option<f64> {
        Some(self.max()? - self.min()?)
    }
}

/// Decide whether a window should raise an alert.
///
/// Returns `false` while the window holds fewer than `capacity` values.
/// Otherwise returns `true` iff `max - min <= threshold`.
pub fn evaluate(window: &SlidingWindow, capacity: usize, threshold: f64) -> bool {
    if window.len() < capacity {
        return false;
    }
    match window.range() {
        Some(range) => range <= threshold,
        None => false,
    }
}

/// The range predicate bound to a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeAlert {
    threshold: f64,
}

impl RangeAlert {
    /// Create a predicate that trips when a full window's range is at most
    /// `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// The configured threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluate against the window's own capacity.
    pub fn check(&self, window: &SlidingWindow) -> bool {
        evaluate(window, window.capacity(), self.threshold)
    }
}

/// Windows of equal capacity, one per key.
///
/// Unkeyed readings share a single window.
#[derive(Debug, Clone)]
pub struct WindowSet {
    capacity: NonZeroUsize,
    shared: SlidingWindow,
    keyed: HashMap<String, SlidingWindow>,
}

impl WindowSet {
    /// Create an empty set whose windows hold `capacity` values.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            shared: SlidingWindow::new(capacity),
            keyed: HashMap::new(),
        }
    }

    /// Push `value` into the window for `key`, creating it on first use.
    ///
    /// Returns the window after the push.
    pub fn push(&mut self, key: Option<&str>, value: f64) -> &SlidingWindow {
        let window = match key {
            None => &mut self.shared,
            Some(key) => {
                let capacity = self.capacity;
                self.keyed
                    .entry(key.to_string())
                    .or_insert_with(|| SlidingWindow::new(capacity))
            }
        };
        window.push(value);
        window
    }

    /// The window for `key`, if it has received any value.
    pub fn get(&self, key: Option<&str>) -> Option<&SlidingWindow> {
        match key {
            None if self.shared.is_empty() => None,
            None => Some(&self.shared),
            Some(key) => self.keyed.get(key),
        }
    }

    /// Number of keyed windows created so far.
    pub fn key_count(&self) -> usize {
        self.keyed.len()
    }

    /// Capacity of every window in the set.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(capacity: usize) -> SlidingWindow {
        SlidingWindow::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn filled(capacity: usize, values: &[f64]) -> SlidingWindow {
        let mut w = window(capacity);
        for &v in values {
            w.push(v);
        }
        w
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        for capacity in 1..=6 {
            let mut w = window(capacity);
            for i in 0..20 {
                w.push(i as f64);
                assert!(w.len() <= capacity);
            }
        }
    }

    #[test]
    fn test_overflow_keeps_last_values_in_order() {
        let w = filled(3, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_push_reports_eviction() {
        let mut w = filled(2, &[1.0, 2.0]);
        assert_eq!(w.push(3.0), Some(1.0));

        let mut w = window(2);
        assert_eq!(w.push(1.0), None);
    }

    #[test]
    fn test_capacity_one() {
        let mut w = window(1);
        w.push(10.0);
        w.push(11.0);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![11.0]);
        assert!(evaluate(&w, 1, 0.0));
    }

    #[test]
    fn test_range_of_empty_window() {
        let w = window(3);
        assert_eq!(w.range(), None);
        assert_eq!(w.min(), None);
        assert_eq!(w.max(), None);
    }

    #[test]
    fn test_stable_window_alerts() {
        let w = filled(5, &[225.0, 225.05, 224.98, 225.1, 225.02]);
        assert!(evaluate(&w, 5, 0.2));
    }

    #[test]
    fn test_spike_does_not_alert() {
        let w = filled(5, &[225.0, 230.0, 224.98, 225.1, 225.02]);
        assert!(!evaluate(&w, 5, 0.2));
    }

    #[test]
    fn test_partial_window_never_alerts() {
        let w = filled(5, &[1.0, 1.0, 1.0]);
        assert!(!evaluate(&w, 5, 0.2));
        assert!(!evaluate(&w, 5, f64::MAX));
    }

    #[test]
    fn test_range_equal_to_threshold_alerts() {
        let w = filled(2, &[1.0, 1.5]);
        assert!(evaluate(&w, 2, 0.5));
        assert!(!evaluate(&w, 2, 0.49));
    }

    #[test]
    fn test_range_ignores_order() {
        let a = filled(4, &[3.0, 1.0, 4.0, 2.0]);
        let b = filled(4, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.range(), b.range());
        assert_eq!(evaluate(&a, 4, 3.0), evaluate(&b, 4, 3.0));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let w = filled(3, &[5.0, 5.1, 5.05]);
        let first = evaluate(&w, 3, 0.2);
        let second = evaluate(&w, 3, 0.2);
        assert_eq!(first, second);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn test_range_alert_uses_window_capacity() {
        let alert = RangeAlert::new(0.2);
        let mut w = window(3);
        w.push(1.0);
        w.push(1.0);
        assert!(!alert.check(&w));
        w.push(1.1);
        assert!(alert.check(&w));
        assert_eq!(alert.threshold(), 0.2);
    }

    #[test]
    fn test_window_set_separates_keys() {
        let mut set = WindowSet::new(NonZeroUsize::new(2).unwrap());

        set.push(Some("a"), 1.0);
        set.push(Some("b"), 100.0);
        let a = set.push(Some("a"), 2.0);

        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(set.get(Some("b")).unwrap().len(), 1);
        assert_eq!(set.key_count(), 2);
        assert!(set.get(None).is_none());
    }

    #[test]
    fn test_window_set_shared_window() {
        let mut set = WindowSet::new(NonZeroUsize::new(3).unwrap());
        set.push(None, 1.0);
        set.push(None, 2.0);

        assert_eq!(set.get(None).unwrap().len(), 2);
        assert_eq!(set.key_count(), 0);
        assert_eq!(set.capacity(), 3);
    }
}
