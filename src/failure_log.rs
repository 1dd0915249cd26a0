//! Plain-text log of every recorded probe failure.
//!
//! One line per failure: RFC 3339 timestamp, a space, the reason. Lines are
//! flushed as they are written so the file can be tailed during a run.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;

pub struct FailureLog {
    out: Box<dyn Write + Send>,
}

impl FailureLog {
    /// Create (or truncate) the log file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create failure log: {}", path.display()))?;
        Ok(Self::from_writer(LineWriter::new(file)))
    }

    pub fn from_writer(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn append(&mut self, occurred_at: DateTime<Utc>, reason: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {}",
            occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            reason
        )?;
        self.out.flush()
    }
}
