//! Process runner for git invocations.
//!
//! Arguments are always passed as a discrete list to
//! [`tokio::process::Command`]; nothing is ever routed through a shell, so
//! user-supplied paths, URLs and commit messages cannot inject commands.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Captured result of one finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Trimmed stdout.
    pub stdout: String,
    /// Trimmed stderr, kept even on success (git reports progress there).
    pub stderr: String,
    /// `None` on exit code 0, otherwise the trimmed stderr (or the exit
    /// status when stderr is empty).
    pub error: Option<String>,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self {
            error: Some(stderr.clone()),
            stderr,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn from_process(output: &Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let error = if output.status.success() {
            None
        } else if stderr.is_empty() {
            Some(format!("exited with {}", output.status))
        } else {
            Some(stderr.clone())
        };
        Self {
            stdout,
            stderr,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Runs the version-control tool in a working directory.
///
/// `Err` means the process could not be run at all (missing binary, missing
/// working directory).  A command that ran and exited non-zero is `Ok` with
/// [`CommandOutput::error`] set.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput>;
}

// ---------------------------------------------------------------------------
// System git
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitRunner {
    binary: String,
    timeout: Duration,
}

impl GitRunner {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for GitRunner {
    #[instrument(skip(self, cwd), fields(cwd = %cwd.display()))]
    async fn run(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).current_dir(cwd);

        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(binary = %self.binary, "spawning command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output.with_context(|| {
                format!(
                    "failed to spawn `{} {}` in {}",
                    self.binary,
                    args.join(" "),
                    cwd.display(),
                )
            })?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "command timed out");
                return Ok(CommandOutput::failure(format!(
                    "`{} {}` timed out after {}s",
                    self.binary,
                    args.join(" "),
                    self.timeout.as_secs(),
                )));
            }
        };

        let result = CommandOutput::from_process(&output);
        debug!(status = %output.status, "command finished");
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_stderr_as_error() {
        let out = CommandOutput::failure("fatal: boom");
        assert!(!out.is_success());
        assert_eq!(out.error.as_deref(), Some("fatal: boom"));
        assert!(CommandOutput::success("ok").is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_trimmed_output_and_exit_status() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = GitRunner::new("sh", Duration::from_secs(10));

        let ok = runner
            .run(tmp.path(), &["-c", "echo '  hello  '; echo progress >&2"])
            .await
            .unwrap();
        assert_eq!(ok.stdout, "hello");
        assert_eq!(ok.stderr, "progress");
        assert!(ok.is_success());

        let failed = runner
            .run(tmp.path(), &["-c", "echo partial; echo 'fatal: nope' >&2; exit 3"])
            .await
            .unwrap();
        assert_eq!(failed.stdout, "partial");
        assert_eq!(failed.error.as_deref(), Some("fatal: nope"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_failure_reports_exit_status() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = GitRunner::new("sh", Duration::from_secs(10));
        let out = runner.run(tmp.path(), &["-c", "exit 7"]).await.unwrap();
        assert!(out.error.unwrap().contains('7'));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = GitRunner::new("echo", Duration::from_secs(10));
        let out = runner
            .run(tmp.path(), &["msg\"; touch injected; echo \""])
            .await
            .unwrap();
        assert_eq!(out.stdout, "msg\"; touch injected; echo \"");
        assert!(!tmp.path().join("injected").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_is_reported_as_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = GitRunner::new("sleep", Duration::from_millis(100));
        let out = runner.run(tmp.path(), &["5"]).await.unwrap();
        assert!(out.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = GitRunner::new("definitely-not-a-real-binary-pushdeck", Duration::from_secs(5));
        let err = runner.run(tmp.path(), &["status"]).await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn missing_working_directory_is_an_error() {
        let runner = GitRunner::new("git", Duration::from_secs(5));
        let result = runner
            .run(Path::new("/nonexistent/pushdeck/worktree"), &["status"])
            .await;
        assert!(result.is_err());
    }
}
