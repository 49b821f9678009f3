//! The push sequence: initialise if needed, stage, commit, rename the branch
//! and push with upstream tracking.
//!
//! The sequence is planned up front as an ordered list of [`PlannedStep`]s
//! and then executed in order.  The first step that fails stops the run and
//! is reported by name.  A commit that fails only because the tree is clean
//! is skipped, so work committed outside the dashboard still gets pushed.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use super::repo::has_git_dir;
use super::runner::{CommandOutput, CommandRunner};
use crate::config::GitConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStep {
    Init,
    AddRemote,
    Stage,
    Commit,
    RenameBranch,
    Push,
}

impl PushStep {
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::AddRemote => "remote add",
            Self::Stage => "add",
            Self::Commit => "commit",
            Self::RenameBranch => "branch",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for PushStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One git invocation in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: PushStep,
    pub args: Vec<String>,
}

impl PlannedStep {
    fn new(step: PushStep, args: &[&str]) -> Self {
        Self {
            step,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Every step succeeded.  `output` is the push's stdout, or its stderr
    /// when stdout is empty (git reports the ref update there).
    Pushed { output: String },
    /// `step` exited non-zero with `stderr`; later steps did not run.
    Failed { step: PushStep, stderr: String },
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

pub struct PushSequence<'a> {
    runner: &'a dyn CommandRunner,
    remote: &'a str,
    branch: &'a str,
}

impl<'a> PushSequence<'a> {
    pub fn new(runner: &'a dyn CommandRunner, git: &'a GitConfig) -> Self {
        Self {
            runner,
            remote: &git.remote,
            branch: &git.branch,
        }
    }

    /// Work out which commands to run for `local_path`.
    ///
    /// A missing `.git` plans `init` plus `remote add`.  An existing
    /// repository is probed with `remote get-url` and only gets `remote add`
    /// when the remote is absent.
    pub async fn plan(
        &self,
        local_path: &Path,
        repo_url: &str,
        commit_message: &str,
    ) -> Result<Vec<PlannedStep>> {
        let mut steps = Vec::with_capacity(6);
        let add_remote = PlannedStep::new(
            PushStep::AddRemote,
            &["remote", "add", self.remote, repo_url],
        );

        if !has_git_dir(local_path).await {
            debug!("no .git entry; planning init");
            steps.push(PlannedStep::new(PushStep::Init, &["init"]));
            steps.push(add_remote);
        } else {
            let probe = self
                .runner
                .run(local_path, &["remote", "get-url", self.remote])
                .await?;
            if !probe.is_success() {
                debug!(remote = %self.remote, "remote missing; planning remote add");
                steps.push(add_remote);
            }
        }

        steps.push(PlannedStep::new(PushStep::Stage, &["add", "."]));
        steps.push(PlannedStep::new(
            PushStep::Commit,
            &["commit", "-m", commit_message],
        ));
        steps.push(PlannedStep::new(
            PushStep::RenameBranch,
            &["branch", "-M", self.branch],
        ));
        steps.push(PlannedStep::new(
            PushStep::Push,
            &["push", "-u", self.remote, self.branch],
        ));
        Ok(steps)
    }

    /// Plan and execute the sequence, stopping at the first failed step.
    ///
    /// `Err` is reserved for commands that could not be spawned at all.
    #[instrument(
        skip(self, local_path, repo_url, commit_message),
        fields(path = %local_path.display(), %repo_url)
    )]
    pub async fn run(
        &self,
        local_path: &Path,
        repo_url: &str,
        commit_message: &str,
    ) -> Result<PushOutcome> {
        let steps = self.plan(local_path, repo_url, commit_message).await?;
        let mut last = CommandOutput::default();

        for planned in &steps {
            let args: Vec<&str> = planned.args.iter().map(String::as_str).collect();
            let output = self.runner.run(local_path, &args).await?;

            if let Some(stderr) = output.error.clone() {
                if planned.step == PushStep::Commit && is_nothing_to_commit(&output) {
                    debug!("nothing to commit; continuing to push");
                    continue;
                }
                warn!(step = %planned.step, %stderr, "push sequence stopped");
                return Ok(PushOutcome::Failed {
                    step: planned.step,
                    stderr,
                });
            }

            debug!(step = %planned.step, "step succeeded");
            last = output;
        }

        info!("push sequence finished");
        let output = if last.stdout.is_empty() {
            last.stderr
        } else {
            last.stdout
        };
        Ok(PushOutcome::Pushed { output })
    }
}

/// `git commit` exits 1 with one of these on stdout when the index matches
/// HEAD.
fn is_nothing_to_commit(output: &CommandOutput) -> bool {
    const MARKERS: [&str; 3] = [
        "nothing to commit",
        "nothing added to commit",
        "no changes added to commit",
    ];
    MARKERS
        .iter()
        .any(|m| output.stdout.contains(m) || output.stderr.contains(m))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
