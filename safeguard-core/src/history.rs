//! Bounded, append-only logs.
//!
//! Alert history, the location trail and the tracking session log all keep
//! only their most recent entries. [`BoundedHistory`] evicts the oldest entry
//! once its capacity is reached.

use std::collections::VecDeque;

use serde::Serialize;

/// FIFO log that never holds more than `capacity` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Creates an empty history. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a history from existing entries, keeping only the newest
    /// `capacity` of them.
    #[must_use]
    pub fn from_entries(entries: Vec<T>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Appends an entry, returning the evicted oldest entry if the log was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Copies the entries out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<T: Serialize> Serialize for BoundedHistory<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut history = BoundedHistory::new(3);
        assert!(history.push(1).is_none());
        assert!(history.push(2).is_none());
        assert_eq!(history.to_vec(), vec![1, 2]);
    }

    #[test]
    fn push_past_capacity_evicts_oldest_first() {
        let mut history = BoundedHistory::new(3);
        for n in 1..=3 {
            history.push(n);
        }
        assert_eq!(history.push(4), Some(1));
        assert_eq!(history.push(5), Some(2));
        assert_eq!(history.to_vec(), vec![3, 4, 5]);
        assert_eq!(history.latest(), Some(&5));
    }

    #[test]
    fn from_entries_trims_to_newest() {
        let history = BoundedHistory::from_entries((1..=60).collect(), 50);
        assert_eq!(history.len(), 50);
        assert_eq!(history.iter().next(), Some(&11));
        assert_eq!(history.latest(), Some(&60));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = BoundedHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec!["b"]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let history = BoundedHistory::from_entries(vec![1, 2], 10);
        assert_eq!(serde_json::to_string(&history).unwrap(), "[1,2]");
    }
}
