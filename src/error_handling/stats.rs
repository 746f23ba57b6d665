//! Run statistics tracking.
//!
//! Thread-safe counters for infrastructure errors, shared across check tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::error;
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe infrastructure error tracker.
///
/// Every `ErrorType` is initialized to zero on creation, so counters can be
/// incremented from many tasks through a shared `Arc` without locking.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }

        ProcessingStats { errors }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            error!(
                "Attempted to increment error counter for {:?} which is not in the map",
                error
            );
        }
    }

    /// Get the count for an error type.
    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total number of errors recorded across all types.
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Non-zero counters, in `ErrorType` declaration order.
    pub fn non_zero(&self) -> Vec<(ErrorType, usize)> {
        ErrorType::iter()
            .map(|t| (t, self.get_error_count(t)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
