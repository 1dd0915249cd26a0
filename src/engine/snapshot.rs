//! Read-only view of engine state handed to the renderer.

use std::time::Duration;

/// A failure as displayed: reason plus whole seconds since it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentError {
    pub reason: String,
    pub age: Duration,
}

/// Everything a frame needs, copied out of the engine at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub target: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub history_capacity: usize,
    pub width: u16,

    pub succeeded: u64,
    pub failed: u64,
    pub total_errors: u64,
    /// Newest first.
    pub recent_errors: Vec<RecentError>,

    pub elapsed: Duration,
    pub tasks: usize,
    pub max_tasks: usize,
    pub memory_kb: u64,
    pub max_memory_kb: u64,

    pub spinner: &'static str,
}

impl Snapshot {
    pub fn attempts(&self) -> u64 {
        self.succeeded + self.failed
    }
}
