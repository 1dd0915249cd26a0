//! Fixed-cadence probe scheduling.
//!
//! The [`Runner`] owns the interval timer. Each tick spawns one attempt bounded
//! by the probe timeout; every attempt produces exactly one [`ProbeOutcome`]
//! on the outcome channel. Attempts may overlap when the interval is shorter
//! than the timeout, in which case outcomes can arrive out of start order.
//!
//! [`ProbeOutcome`]: crate::probes::ProbeOutcome

pub mod runner;

pub use self::runner::{attempt, Runner};

/// Outcome channel capacity: one in-flight outcome, senders wait beyond that.
pub const OUTCOME_BUFFER: usize = 1;
