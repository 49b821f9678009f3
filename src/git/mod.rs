//! Git command runner and the dashboard's push sequence.
//!
//! All operations shell out to the `git` binary through
//! `tokio::process::Command`, passing arguments as a list.  Authentication is
//! left to the ambient git setup (SSH agent, credential helpers).

pub mod push;
pub mod repo;
pub mod runner;

pub use push::{PushOutcome, PushSequence};
pub use repo::{detect_repo_url, effective_commit_message};
pub use runner::{CommandRunner, GitRunner};
