//! Run-scoped duplicate suppression.

use std::collections::HashSet;

/// Tracks job identifiers seen during a single run. Never persisted.
#[derive(Debug, Default)]
pub struct SeenSet {
    seen: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a key is seen this run, false thereafter.
    /// Must be consulted before emission, never after.
    pub fn admit(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
