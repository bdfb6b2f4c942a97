//! External executables (tesseract, ffmpeg).
//!
//! Binaries are found from an explicit path, then an environment variable,
//! then `PATH`. Runs are bounded by a timeout and the child is killed when
//! it expires.

use crate::{FolioError, Result};
use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Description of an external tool.
pub(crate) struct Tool {
    pub name: &'static str,
    pub env_var: &'static str,
    pub binaries: &'static [&'static str],
    pub install_hint: &'static str,
}

impl Tool {
    fn missing(&self) -> FolioError {
        FolioError::MissingDependency(format!(
            "{} is required but was not found. {} \
If it is installed in a custom location, set the {} environment variable to the executable.",
            self.name, self.install_hint, self.env_var
        ))
    }

    fn candidates(&self, explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut push_candidate = |path: PathBuf| {
            if seen.insert(path.clone()) {
                candidates.push(path);
            }
        };

        if let Some(path) = explicit {
            push_candidate(path.to_path_buf());
        }
        if let Some(value) = env::var_os(self.env_var).filter(|v| !v.is_empty()) {
            push_candidate(PathBuf::from(value));
        }
        if let Some(path_env) = env::var_os("PATH") {
            for dir in env::split_paths(&path_env) {
                for binary in self.binaries {
                    push_candidate(dir.join(binary));
                }
            }
        }
        candidates
    }

    /// Resolve the executable.
    ///
    /// An explicit path that does not exist is an error rather than a reason
    /// to fall back to `PATH`.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit
            && !path.is_file()
        {
            return Err(FolioError::MissingDependency(format!(
                "{} executable '{}' does not exist",
                self.name,
                path.display()
            )));
        }

        self.candidates(explicit)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| self.missing())
    }
}

/// Why a run did not produce output.
#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(std::io::Error),
    Wait(std::io::Error),
    TimedOut(u64),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Spawn(e) => write!(f, "failed to start: {}", e),
            RunError::Wait(e) => write!(f, "failed while running: {}", e),
            RunError::TimedOut(secs) => write!(f, "timed out after {} seconds", secs),
        }
    }
}

/// Run `program` with `args`, optionally feeding `stdin`, within `timeout_secs`.
///
/// A non-zero exit status is not an error here; callers inspect `Output`.
pub(crate) async fn run_with_timeout(
    program: &Path,
    args: &[OsString],
    stdin: Option<Vec<u8>>,
    timeout_secs: u64,
) -> std::result::Result<Output, RunError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(RunError::Spawn)?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(bytes)) = (pipe, stdin) {
            pipe.write_all(&bytes).await?;
            pipe.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    let run = async { tokio::join!(feed, child.wait_with_output()) };
    let (fed, output) = timeout(Duration::from_secs(timeout_secs), run)
        .await
        .map_err(|_| RunError::TimedOut(timeout_secs))?;

    let output = output.map_err(RunError::Wait)?;
    // A tool that exits early closes its stdin; report the exit status instead.
    if let Err(e) = fed
        && output.status.success()
    {
        return Err(RunError::Wait(e));
    }
    Ok(output)
}

/// Last non-empty lines of a tool's stderr, for error messages.
pub(crate) fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}
