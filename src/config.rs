//! Run configuration: TOML defaults, command-line overrides, validation.
//!
//! Values come from, lowest priority first:
//! 1. Compiled-in defaults.
//! 2. A TOML settings file (`--config` or `GITTER_CONFIG`).
//! 3. Command-line flags.
//!
//! Everything is validated before the engine starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::probes::ProbeMode;

pub const MIN_WIDTH: u16 = 50;
pub const MAX_WIDTH: u16 = 300;

/// Target label shown when running the simulated prober.
pub const DEMO_TARGET: &str = "https://github.com/demo/repo.git (simulated)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("interval must be positive, got {}", humantime::format_duration(*.0))]
    NonPositiveInterval(Duration),

    #[error("timeout must be positive, got {}", humantime::format_duration(*.0))]
    NonPositiveTimeout(Duration),

    #[error("width must be between {min} and {max}, got {width}", min = MIN_WIDTH, max = MAX_WIDTH)]
    WidthOutOfRange { width: u16 },

    #[error("error-history must be positive, got {0}")]
    EmptyHistory(usize),

    #[error("repository URL is required when not in demo mode")]
    MissingTarget,

    #[error("invalid {key} '{value}': {reason}")]
    InvalidDuration {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Defaults read from the optional settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Time between attempts, humantime syntax (`"2s"`, `"500ms"`).
    pub interval: String,
    /// Per-attempt deadline, humantime syntax.
    pub timeout: String,
    /// Dashboard width in columns.
    pub width: u16,
    /// How many recent failures to keep on screen.
    pub error_history: usize,
    /// Failure log written in git mode.
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: "2s".to_string(),
            timeout: "10s".to_string(),
            width: 100,
            error_history: 5,
            log_file: PathBuf::from("gitter.log"),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply command-line overrides and validate the result.
    pub fn resolve(&self, overrides: Overrides) -> Result<RunConfig, ConfigError> {
        let interval = match overrides.interval {
            Some(d) => d,
            None => parse_duration("interval", &self.interval)?,
        };
        let timeout = match overrides.timeout {
            Some(d) => d,
            None => parse_duration("timeout", &self.timeout)?,
        };

        let (target, mode, failure_log) = if overrides.demo {
            (DEMO_TARGET.to_string(), ProbeMode::Simulated, None)
        } else {
            let target = overrides
                .target
                .filter(|t| !t.trim().is_empty())
                .ok_or(ConfigError::MissingTarget)?;
            let log = overrides.log_file.unwrap_or_else(|| self.log_file.clone());
            (target, ProbeMode::Git, Some(log))
        };

        let config = RunConfig {
            target,
            mode,
            interval,
            timeout,
            width: overrides.width.unwrap_or(self.width),
            history_capacity: overrides.error_history.unwrap_or(self.error_history),
            failure_log,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Values given on the command line; `None` falls back to [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: Option<String>,
    pub demo: bool,
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub width: Option<u16>,
    pub error_history: Option<usize>,
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target: String,
    pub mode: ProbeMode,
    pub interval: Duration,
    pub timeout: Duration,
    pub width: u16,
    pub history_capacity: usize,
    /// `None` in simulated mode.
    pub failure_log: Option<PathBuf>,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval(self.interval));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::NonPositiveTimeout(self.timeout));
        }
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.width) {
            return Err(ConfigError::WidthOutOfRange { width: self.width });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::EmptyHistory(self.history_capacity));
        }
        if self.target.trim().is_empty() {
            return Err(ConfigError::MissingTarget);
        }
        Ok(())
    }

    /// Attempts can overlap when a new tick fires before the last deadline.
    pub fn allows_overlap(&self) -> bool {
        self.interval < self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_overrides() -> Overrides {
        Overrides {
            target: Some("https://github.com/user/repo.git".to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults_resolve() {
        let config = Settings::default().resolve(git_overrides()).unwrap();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.width, 100);
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.mode, ProbeMode::Git);
        assert_eq!(config.failure_log, Some(PathBuf::from("gitter.log")));
        assert!(config.allows_overlap());
    }

    #[test]
    fn test_demo_needs_no_target_and_has_no_log() {
        let config = Settings::default()
            .resolve(Overrides {
                demo: true,
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.target, DEMO_TARGET);
        assert_eq!(config.mode, ProbeMode::Simulated);
        assert_eq!(config.failure_log, None);
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = Settings::default()
            .resolve(Overrides::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingTarget);
        assert_eq!(
            err.to_string(),
            "repository URL is required when not in demo mode"
        );
    }

    #[test]
    fn test_overrides_win_over_settings() {
        let config = Settings::default()
            .resolve(Overrides {
                interval: Some(Duration::from_millis(500)),
                timeout: Some(Duration::from_secs(30)),
                width: Some(150),
                error_history: Some(8),
                log_file: Some(PathBuf::from("/tmp/other.log")),
                ..git_overrides()
            })
            .unwrap();
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.width, 150);
        assert_eq!(config.history_capacity, 8);
        assert_eq!(config.failure_log, Some(PathBuf::from("/tmp/other.log")));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            (
                Overrides {
                    interval: Some(Duration::ZERO),
                    ..git_overrides()
                },
                "interval must be positive, got 0s",
            ),
            (
                Overrides {
                    timeout: Some(Duration::ZERO),
                    ..git_overrides()
                },
                "timeout must be positive, got 0s",
            ),
            (
                Overrides {
                    width: Some(30),
                    ..git_overrides()
                },
                "width must be between 50 and 300, got 30",
            ),
            (
                Overrides {
                    width: Some(400),
                    ..git_overrides()
                },
                "width must be between 50 and 300, got 400",
            ),
            (
                Overrides {
                    error_history: Some(0),
                    ..git_overrides()
                },
                "error-history must be positive, got 0",
            ),
        ];

        for (overrides, message) in cases {
            let err = Settings::default().resolve(overrides).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_width_bounds_inclusive() {
        for width in [MIN_WIDTH, MAX_WIDTH] {
            let config = Settings::default().resolve(Overrides {
                width: Some(width),
                ..git_overrides()
            });
            assert!(config.is_ok(), "width {width} should be accepted");
        }
    }

    #[test]
    fn test_settings_file_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitter.toml");
        std::fs::write(
            &path,
            "interval = \"750ms\"\nerror_history = 12\nwidth = 120\n",
        )
        .unwrap();

        let settings = Settings::load_or_default(Some(&path)).unwrap();
        assert_eq!(settings.interval, "750ms");
        assert_eq!(settings.error_history, 12);
        assert_eq!(settings.width, 120);
        // Unset keys keep their defaults.
        assert_eq!(settings.timeout, "10s");

        let config = settings.resolve(git_overrides()).unwrap();
        assert_eq!(config.interval, Duration::from_millis(750));
        assert!(!config.allows_overlap() || config.interval < config.timeout);
    }

    #[test]
    fn test_bad_duration_in_settings_rejected() {
        let settings = Settings {
            timeout: "soon".to_string(),
            ..Settings::default()
        };
        let err = settings.resolve(git_overrides()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { key: "timeout", .. }));
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_no_settings_file_uses_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
