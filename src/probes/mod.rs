//! Probe attempts against a git remote.
//!
//! A [`Prober`] performs one attempt against a target and must give up once
//! the supplied deadline passes. Two implementations exist: [`git::GitProber`]
//! shells out to `git clone`, [`simulated::SimulatedProber`] fakes latency and
//! failures for demos and tests.

pub mod git;
pub mod simulated;

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;

/// Reason a single probe attempt failed.
///
/// These are expected outcomes, recorded as data and never retried.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("failed to launch git: {0}")]
    Launch(#[source] std::io::Error),

    #[error("failed to create clone workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("{reason}")]
    Remote { reason: String },
}

/// Result of one scheduled attempt, as consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure { reason: String },
}

impl ProbeOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        ProbeOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

impl From<Result<(), ProbeError>> for ProbeOutcome {
    fn from(result: Result<(), ProbeError>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Success,
            Err(e) => ProbeOutcome::failure(e.to_string()),
        }
    }
}

/// Which prober backs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    Git,
    Simulated,
}

impl std::fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeMode::Git => write!(f, "git"),
            ProbeMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// Capability to perform one probe attempt.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Attempt a fetch of `target`, resolving no later than `deadline`.
    async fn attempt(&self, target: &str, deadline: Instant) -> Result<(), ProbeError>;
}

/// Build the prober for a run mode.
pub fn for_mode(mode: ProbeMode) -> Arc<dyn Prober> {
    match mode {
        ProbeMode::Git => Arc::new(git::GitProber::default()),
        ProbeMode::Simulated => Arc::new(simulated::SimulatedProber::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_ok_is_success() {
        assert_eq!(ProbeOutcome::from(Ok(())), ProbeOutcome::Success);
    }

    #[test]
    fn test_outcome_from_deadline_error() {
        let outcome = ProbeOutcome::from(Err(ProbeError::DeadlineExceeded));
        assert_eq!(outcome, ProbeOutcome::failure("deadline exceeded"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_remote_error_message_is_reason() {
        let err = ProbeError::Remote {
            reason: "repository not found".to_string(),
        };
        assert_eq!(err.to_string(), "repository not found");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ProbeMode::Git.to_string(), "git");
        assert_eq!(ProbeMode::Simulated.to_string(), "simulated");
    }
}
