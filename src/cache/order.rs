//! Insertion Order Module
//!
//! Remembers the order in which keys first entered the memory tier.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks first-insertion order of keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Re-inserting a tracked key keeps its original position.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Keys in the order they were first inserted
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty order tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Appends a key unless it is already tracked.
    pub fn record(&mut self, key: &str) {
        if !self.contains(key) {
            self.order.push_back(key.to_string());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Iterate ==
    /// Iterates over keys from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
