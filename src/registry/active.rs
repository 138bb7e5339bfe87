//! # Active-code tracker.
//!
//! Counts, per status code, how many live registrations subscribe to it
//! (single- and multi-code handlers; default handlers subscribe to nothing and
//! are not counted). A code is present only while its count is positive.

use std::collections::HashMap;

use crate::types::StatusCode;

/// Reference counts of subscribed status codes.
#[derive(Debug, Default)]
pub struct ActiveCodes {
    counts: HashMap<StatusCode, usize>,
}

impl ActiveCodes {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more registration for `code`.
    pub fn add(&mut self, code: StatusCode) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    /// Drops one registration for `code`, removing the code when it reaches zero.
    ///
    /// Returns false if `code` was not tracked.
    pub fn remove(&mut self, code: StatusCode) -> bool {
        let Some(count) = self.counts.get_mut(&code) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&code);
        }
        true
    }

    /// Number of registrations for `code`.
    pub fn count(&self, code: StatusCode) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// True if at least one registration subscribes to `code`.
    pub fn is_active(&self, code: StatusCode) -> bool {
        self.counts.contains_key(&code)
    }

    /// Number of distinct active codes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if no code is active.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Active codes in ascending order.
    pub fn codes(&self) -> Vec<StatusCode> {
        let mut codes: Vec<StatusCode> = self.counts.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    pub(crate) fn clear(&mut self) {
        self.counts.clear();
    }
}
