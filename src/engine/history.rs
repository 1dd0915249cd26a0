//! Rolling history of recent probe failures.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

/// Bounded FIFO of the most recent failures plus an all-time total.
///
/// Eviction never touches `total`.
#[derive(Debug, Clone)]
pub struct ErrorHistory {
    ring: VecDeque<ErrorRecord>,
    capacity: usize,
    total: u64,
}

impl ErrorHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    pub fn record(&mut self, error: impl Into<String>, occurred_at: DateTime<Utc>) {
        self.total += 1;
        self.ring.push_back(ErrorRecord {
            error: error.into(),
            occurred_at,
        });
        while self.ring.len() > self.capacity {
            self.ring.pop_front();
        }
    }

    /// Oldest to newest.
    pub fn recent(&self) -> impl DoubleEndedIterator<Item = &ErrorRecord> + ExactSizeIterator {
        self.ring.iter()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
