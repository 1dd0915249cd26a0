//! Dashboard engine: owns all run state and drives the render loop.
//!
//! The engine is a two-state machine (`Running`, `Terminated`). Every input
//! (probe outcomes, resource samples, spinner ticks, resizes, cancellation)
//! arrives as an [`Event`] and is applied by [`Engine::handle`] before the
//! next one is received. Rendering reads an owned [`Snapshot`], so nothing
//! outside the engine task ever touches the state.

pub mod history;
pub mod snapshot;
pub mod stats;

pub use self::history::{ErrorHistory, ErrorRecord};
pub use self::snapshot::{RecentError, Snapshot};
pub use self::stats::{ProcessUsage, ResourceSample, ResourceStats, UsageSource};

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::failure_log::FailureLog;
use crate::probes::ProbeOutcome;

/// How often process usage is sampled.
pub const SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Spinner frame rate (10 fps).
pub const SPINNER_PERIOD: Duration = Duration::from_millis(100);

const SPINNER_FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Everything the engine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Probe(ProbeOutcome),
    Sample(ResourceSample),
    SpinnerTick,
    /// Terminal resized; redraw without changing state.
    Redraw,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Running,
    Terminated,
}

/// Keyboard and terminal input, already decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Resize,
}

/// Draws one frame from a snapshot. Errors are fatal to the run.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Run state owned by the engine.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub config: RunConfig,
    pub history: ErrorHistory,
    pub stats: ResourceStats,
    pub succeeded: u64,
    pub failed: u64,
}

impl EngineState {
    pub fn new(config: RunConfig) -> Self {
        let history = ErrorHistory::new(config.history_capacity);
        Self {
            config,
            history,
            stats: ResourceStats::new(),
            succeeded: 0,
            failed: 0,
        }
    }
}

pub struct Engine {
    state: EngineState,
    status: EngineStatus,
    spinner: usize,
    failure_log: Option<FailureLog>,
}

impl Engine {
    pub fn new(config: RunConfig, failure_log: Option<FailureLog>) -> Self {
        Self {
            state: EngineState::new(config),
            status: EngineStatus::Running,
            spinner: 0,
            failure_log,
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Apply one event. Once terminated, further events are ignored.
    pub fn handle(&mut self, event: Event) -> EngineStatus {
        if self.status == EngineStatus::Terminated {
            return self.status;
        }

        match event {
            Event::Probe(ProbeOutcome::Success) => {
                self.state.succeeded += 1;
            }
            Event::Probe(ProbeOutcome::Failure { reason }) => {
                self.state.failed += 1;
                let now = Utc::now();
                if let Some(log) = self.failure_log.as_mut() {
                    if let Err(e) = log.append(now, &reason) {
                        warn!(error = %e, "Failed to write failure log");
                    }
                }
                debug!(%reason, total = self.state.history.total() + 1, "Probe failed");
                self.state.history.record(reason, now);
            }
            Event::Sample(sample) => self.state.stats.record(sample),
            Event::SpinnerTick => {
                self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
            }
            Event::Redraw => {}
            Event::Cancel => {
                info!(
                    succeeded = self.state.succeeded,
                    failed = self.state.failed,
                    "Engine terminated"
                );
                self.status = EngineStatus::Terminated;
            }
        }
        self.status
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(Utc::now())
    }

    /// Snapshot with error ages measured against `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Snapshot {
        let state = &self.state;
        let recent_errors = state
            .history
            .recent()
            .rev()
            .map(|record| RecentError {
                reason: record.error.clone(),
                age: (now - record.occurred_at)
                    .to_std()
                    .map(|age| Duration::from_secs(age.as_secs()))
                    .unwrap_or(Duration::ZERO),
            })
            .collect();

        Snapshot {
            target: state.config.target.clone(),
            interval: state.config.interval,
            timeout: state.config.timeout,
            history_capacity: state.history.capacity(),
            width: state.config.width,
            succeeded: state.succeeded,
            failed: state.failed,
            total_errors: state.history.total(),
            recent_errors,
            elapsed: state.stats.elapsed(),
            tasks: state.stats.current().concurrent_tasks,
            max_tasks: state.stats.max_tasks(),
            memory_kb: state.stats.current_memory_kb(),
            max_memory_kb: state.stats.max_memory_kb(),
            spinner: SPINNER_FRAMES[self.spinner],
        }
    }

    /// Drive the engine until cancelled or asked to quit.
    ///
    /// Renders once up front and after every event that leaves the engine
    /// running. On exit the token is cancelled so the scheduler winds down too.
    pub async fn run<R, I, U>(
        mut self,
        renderer: &mut R,
        input: I,
        outcomes: mpsc::Receiver<ProbeOutcome>,
        usage: U,
        cancel: CancellationToken,
    ) -> Result<EngineState>
    where
        R: Renderer + ?Sized,
        I: Stream<Item = InputEvent> + Unpin,
        U: UsageSource,
    {
        let result = self
            .drive(renderer, input, outcomes, usage, &cancel)
            .await;
        cancel.cancel();
        result.map(|()| self.state)
    }

    async fn drive<R, I, U>(
        &mut self,
        renderer: &mut R,
        mut input: I,
        mut outcomes: mpsc::Receiver<ProbeOutcome>,
        mut usage: U,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: Renderer + ?Sized,
        I: Stream<Item = InputEvent> + Unpin,
        U: UsageSource,
    {
        let mut sample_ticker = interval(SAMPLE_PERIOD);
        sample_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut spinner_ticker = interval_at(Instant::now() + SPINNER_PERIOD, SPINNER_PERIOD);
        spinner_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut input_open = true;

        renderer.render(&self.snapshot())?;

        loop {
            let event = tokio::select! {
                biased;

                _ = cancel.cancelled() => Event::Cancel,

                next = input.next(), if input_open => match next {
                    Some(InputEvent::Quit) => Event::Cancel,
                    Some(InputEvent::Resize) => Event::Redraw,
                    None => {
                        debug!("Input stream closed");
                        input_open = false;
                        continue;
                    }
                },

                Some(outcome) = outcomes.recv() => Event::Probe(outcome),

                _ = sample_ticker.tick() => Event::Sample(usage.read()),

                _ = spinner_ticker.tick() => Event::SpinnerTick,
            };

            if self.handle(event) == EngineStatus::Terminated {
                return Ok(());
            }
            renderer.render(&self.snapshot())?;
        }
    }
}
