//! gitter -- watch a git server's stability by cloning on a fixed cadence.
//!
//! This crate provides the probe backends, the fixed-interval scheduler, the
//! dashboard engine with its rolling error history and resource stats, and the
//! terminal renderer.

pub mod config;
pub mod engine;
pub mod failure_log;
pub mod probes;
pub mod scheduler;
pub mod ui;

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::engine::{Engine, EngineState, ProcessUsage};
use crate::failure_log::FailureLog;
use crate::probes::ProbeOutcome;
use crate::scheduler::{Runner, OUTCOME_BUFFER};

/// Totals reported once the dashboard has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl From<&EngineState> for Summary {
    fn from(state: &EngineState) -> Self {
        Self {
            succeeded: state.succeeded,
            failed: state.failed,
            elapsed: state.stats.elapsed(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed in {}",
            self.succeeded,
            self.failed,
            humantime::format_duration(self.elapsed)
        )
    }
}

/// Run the dashboard until the user quits or SIGINT arrives.
pub async fn run(config: RunConfig) -> Result<Summary> {
    // 1. Validate
    config.validate()?;
    if config.allows_overlap() {
        warn!(
            interval = ?config.interval,
            timeout = ?config.timeout,
            "Interval is shorter than timeout; attempts may overlap"
        );
    }

    // 2. Open the failure log (git mode only)
    let failure_log = match &config.failure_log {
        Some(path) => {
            info!(path = %path.display(), "Writing failures to log file");
            Some(FailureLog::create(path)?)
        }
        None => None,
    };

    // 3. Start the scheduler
    let prober = probes::for_mode(config.mode);
    let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_BUFFER);
    let cancel = CancellationToken::new();
    let runner = Runner::new(
        prober,
        config.target.clone(),
        config.interval,
        config.timeout,
    )
    .spawn(outcome_tx, cancel.clone());

    // 4. SIGINT shares the token with the keyboard
    let sigint = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    info!("Received SIGINT, shutting down");
                    sigint.cancel();
                }
            }
            () = sigint.cancelled() => {}
        }
    });

    // 5. Drive the dashboard on this task
    info!(mode = %config.mode, target = %config.target, "Starting dashboard");
    let result = run_dashboard(config, failure_log, outcome_rx, cancel.clone()).await;

    // 6. Stop the scheduler and wait for it so the timer is not leaked
    cancel.cancel();
    if let Err(e) = runner.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }

    let state = result?;
    Ok(Summary::from(&state))
}

async fn run_dashboard(
    config: RunConfig,
    failure_log: Option<FailureLog>,
    outcomes: mpsc::Receiver<ProbeOutcome>,
    cancel: CancellationToken,
) -> Result<EngineState> {
    ui::terminal::install_panic_hook();
    let terminal = ui::terminal::setup_terminal()?;
    let _guard = ui::terminal::TerminalGuard::new();

    let mut renderer = ui::TerminalRenderer::new(terminal);
    Engine::new(config, failure_log)
        .run(
            &mut renderer,
            ui::input_events(),
            outcomes,
            ProcessUsage::new(),
            cancel,
        )
        .await
}
