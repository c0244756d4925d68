// BoundedHistory - fixed-capacity FIFO history
//
// Used for blow histories, balloon pressure samples, calibration RMS values and
// the event log. Pushing into a full history evicts the oldest entry, so the
// length never exceeds the capacity.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Fixed-capacity history that evicts its oldest entry when full
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history holding at most `capacity` entries
    ///
    /// A capacity of zero is bumped to one so every push is observable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted oldest entry if the history was full
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest-to-newest iteration
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    /// The newest `count` entries, oldest first
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &T> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip)
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        let mut history = BoundedHistory::new(3);
        assert_eq!(history.push(1), None);
        assert_eq!(history.push(2), None);
        assert_eq!(history.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_push_at_capacity_evicts_oldest() {
        let mut history = BoundedHistory::new(3);
        for value in 1..=3 {
            history.push(value);
        }
        assert_eq!(history.push(4), Some(1));
        assert_eq!(history.len(), 3);
        assert_eq!(history.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut history = BoundedHistory::new(50);
        for value in 0..500 {
            history.push(value);
            assert!(history.len() <= history.capacity());
        }
        assert_eq!(history.iter().next(), Some(&450));
    }

    #[test]
    fn test_latest_returns_newest_in_order() {
        let mut history = BoundedHistory::new(10);
        for value in 0..6 {
            history.push(value);
        }
        let latest: Vec<_> = history.latest(3).copied().collect();
        assert_eq!(latest, vec![3, 4, 5]);

        let all: Vec<_> = history.latest(20).copied().collect();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let mut history = BoundedHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec!["b"]);
    }
}
