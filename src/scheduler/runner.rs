use crate::probes::{ProbeError, ProbeOutcome, Prober};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fires one probe attempt per tick and forwards exactly one outcome per
/// attempt.
pub struct Runner {
    prober: Arc<dyn Prober>,
    target: String,
    interval: Duration,
    timeout: Duration,
}

impl Runner {
    pub fn new(
        prober: Arc<dyn Prober>,
        target: impl Into<String>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            prober,
            target: target.into(),
            interval,
            timeout,
        }
    }

    /// Spawn the tick loop on its own task.
    pub fn spawn(
        self,
        outcomes: mpsc::Sender<ProbeOutcome>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(outcomes, cancel))
    }

    /// Tick until cancelled. In-flight attempts are aborted on the way out.
    pub async fn run(self, outcomes: mpsc::Sender<ProbeOutcome>, cancel: CancellationToken) {
        info!(target = %self.target, interval = ?self.interval, timeout = ?self.timeout, "Scheduler started");

        // First attempt after one full interval, like a plain ticker.
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = JoinSet::new();
        let mut fired: u64 = 0;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    fired += 1;
                    debug!(attempt = fired, in_flight = attempts.len(), "Tick");
                    attempts.spawn(deliver(
                        Arc::clone(&self.prober),
                        self.target.clone(),
                        self.timeout,
                        outcomes.clone(),
                        cancel.clone(),
                    ));
                }
                Some(joined) = attempts.join_next(), if !attempts.is_empty() => {
                    if let Err(e) = joined {
                        error!("Probe attempt task failed: {}", e);
                    }
                }
            }
        }

        attempts.abort_all();
        info!(attempts = fired, "Scheduler stopped");
    }
}

/// Run one attempt bounded by `timeout` and hand its outcome over.
///
/// Waits for channel capacity instead of dropping; gives up only on shutdown.
async fn deliver(
    prober: Arc<dyn Prober>,
    target: String,
    timeout: Duration,
    outcomes: mpsc::Sender<ProbeOutcome>,
    cancel: CancellationToken,
) {
    let outcome = attempt(prober.as_ref(), &target, timeout).await;
    tokio::select! {
        sent = outcomes.send(outcome) => {
            if sent.is_err() {
                debug!("Outcome receiver closed");
            }
        }
        () = cancel.cancelled() => {}
    }
}

/// One attempt with `deadline = now + timeout`.
///
/// The prober is raced against the deadline so a prober that ignores it still
/// yields a deadline-exceeded failure on time.
pub async fn attempt(prober: &dyn Prober, target: &str, timeout: Duration) -> ProbeOutcome {
    let deadline = Instant::now() + timeout;
    match tokio::time::timeout_at(deadline, prober.attempt(target, deadline)).await {
        Ok(result) => ProbeOutcome::from(result),
        Err(_) => ProbeOutcome::from(Err(ProbeError::DeadlineExceeded)),
    }
}
