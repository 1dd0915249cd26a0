//! Real clone probe (shells out to `git`).

use super::{ProbeError, Prober};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::task;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Shallow, bare clone of the target into a throwaway directory.
///
/// Credential prompts are disabled so an auth failure is reported as a
/// failure instead of hanging on the terminal. The child is killed if the
/// attempt is dropped (deadline or shutdown).
pub struct GitProber {
    program: PathBuf,
}

impl Default for GitProber {
    fn default() -> Self {
        Self::with_program("git")
    }
}

impl GitProber {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl Prober for GitProber {
    async fn attempt(&self, target: &str, deadline: Instant) -> Result<(), ProbeError> {
        // Removed on drop, whatever the outcome.
        let workspace = Workspace::create().await?;

        let mut cmd = Command::new(&self.program);
        cmd.args([
            "clone",
            "--quiet",
            "--bare",
            "--depth",
            "1",
            "--single-branch",
            "--no-tags",
            "--",
        ])
        .arg(target)
        .arg(workspace.path())
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let output = tokio::time::timeout_at(deadline, cmd.output())
            .await
            .map_err(|_| ProbeError::DeadlineExceeded)?
            .map_err(ProbeError::Launch)?;

        if output.status.success() {
            debug!(%target, "clone succeeded");
            Ok(())
        } else {
            Err(ProbeError::Remote {
                reason: summarize_stderr(&output.stderr, output.status.code()),
            })
        }
    }
}

/// Scratch directory for one clone, created and removed off the async threads.
struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    async fn create() -> Result<Self, ProbeError> {
        let dir = task::spawn_blocking(|| tempfile::Builder::new().prefix("gitter-").tempdir())
            .await
            .map_err(|e| ProbeError::Workspace(io::Error::new(io::ErrorKind::Other, e)))?
            .map_err(ProbeError::Workspace)?;
        Ok(Self { dir: Some(dir) })
    }

    fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), |d| d.path())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        // A bare clone can be large; deleting it must not stall the runtime.
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_workspace(dir));
            }
            Err(_) => remove_workspace(dir),
        }
    }
}

fn remove_workspace(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(path = %path.display(), "Failed to remove clone workspace: {}", e);
    }
}

/// Pick the line of git's stderr that explains the failure.
///
/// Git usually ends with a `fatal:` line; earlier `remote:` chatter is noise.
fn summarize_stderr(stderr: &[u8], code: Option<i32>) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let chosen = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("fatal: "))
        .or_else(|| lines.last());

    match chosen {
        Some(line) => line
            .strip_prefix("fatal: ")
            .or_else(|| line.strip_prefix("error: "))
            .unwrap_or(line)
            .to_string(),
        None => match code {
            Some(code) => format!("git exited with status {}", code),
            None => "git terminated by signal".to_string(),
        },
    }
}
