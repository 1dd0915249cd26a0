//! Simulated clone probe for demo mode.
//!
//! Latency is drawn uniformly from a bounded range and the attempt succeeds
//! with a fixed probability; otherwise one of [`CANNED_FAILURES`] is returned.

use super::{ProbeError, Prober};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Failure reasons a real git server commonly produces.
pub const CANNED_FAILURES: [&str; 8] = [
    "connection timeout",
    "repository not found",
    "authentication failed",
    "network unreachable",
    "remote hung up unexpectedly",
    "permission denied",
    "could not resolve host",
    "ssl certificate problem",
];

pub const DEFAULT_LATENCY_MS: Range<u64> = 500..3000;
pub const DEFAULT_SUCCESS_RATE: f64 = 0.8;

pub struct SimulatedProber {
    latency_ms: Range<u64>,
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl Default for SimulatedProber {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
            success_rate: DEFAULT_SUCCESS_RATE,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl SimulatedProber {
    /// Deterministic prober; `success_rate` is clamped to `0.0..=1.0` and an
    /// empty latency range means zero latency.
    pub fn with_seed(seed: u64, latency_ms: Range<u64>, success_rate: f64) -> Self {
        Self {
            latency_ms,
            success_rate: success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Decide latency and result up front so the lock is never held across
    /// an await.
    fn roll(&self) -> (Duration, Option<&'static str>) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let latency = if self.latency_ms.is_empty() {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(self.latency_ms.clone()))
        };
        let failure = if rng.gen_bool(self.success_rate) {
            None
        } else {
            CANNED_FAILURES.choose(&mut *rng).copied()
        };
        (latency, failure)
    }
}

#[async_trait::async_trait]
impl Prober for SimulatedProber {
    async fn attempt(&self, _target: &str, deadline: Instant) -> Result<(), ProbeError> {
        let (latency, failure) = self.roll();
        let finish = Instant::now() + latency;

        if finish > deadline {
            tokio::time::sleep_until(deadline).await;
            return Err(ProbeError::DeadlineExceeded);
        }
        tokio::time::sleep_until(finish).await;

        match failure {
            None => Ok(()),
            Some(reason) => Err(ProbeError::Remote {
                reason: reason.to_string(),
            }),
        }
    }
}
