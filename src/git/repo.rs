//! Working-tree inspection helpers that do not need to spawn git.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{debug, instrument};

/// Whether `local_path` already has a `.git` entry.  Linked worktrees and
/// submodules use a `.git` file instead of a directory, so either counts.
pub async fn has_git_dir(local_path: &Path) -> bool {
    tokio::fs::try_exists(local_path.join(".git"))
        .await
        .unwrap_or(false)
}

/// Read the first `url = ...` entry from `<local_path>/.git/config`.
///
/// Returns `None` when the repository or its config is missing, or no remote
/// URL is configured.
#[instrument(fields(path = %local_path.display()))]
pub async fn detect_repo_url(local_path: &Path) -> Result<Option<String>> {
    let config_path = local_path.join(".git").join("config");
    let contents = match tokio::fs::read_to_string(&config_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read {}", config_path.display()))
        }
    };

    let url = parse_remote_url(&contents);
    debug!(found = url.is_some(), "scanned git config for remote url");
    Ok(url)
}

fn parse_remote_url(config: &str) -> Option<String> {
    config.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if key.trim() != "url" {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Commit message used when the form's message is blank.
pub fn auto_commit_message(now: DateTime<Local>) -> String {
    format!("Auto update on {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// `message` trimmed, or an auto-generated timestamp message when blank.
pub fn effective_commit_message(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        auto_commit_message(Local::now())
    } else {
        message.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// `Auto update on YYYY-MM-DD HH:MM:SS`
    fn is_auto_message(msg: &str) -> bool {
        let Some(stamp) = msg.strip_prefix("Auto update on ") else {
            return false;
        };
        let bytes = stamp.as_bytes();
        bytes.len() == 19
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                10 => *b == b' ',
                13 | 16 => *b == b':',
                _ => b.is_ascii_digit(),
            })
    }

    #[test]
    fn auto_message_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(auto_commit_message(now), "Auto update on 2024-03-09 07:05:01");
    }

    #[test]
    fn blank_message_is_generated() {
        assert!(is_auto_message(&effective_commit_message("")));
        assert!(is_auto_message(&effective_commit_message("   ")));
    }

    #[test]
    fn explicit_message_is_kept() {
        assert_eq!(effective_commit_message("  fix typo "), "fix typo");
        assert!(!is_auto_message("fix typo"));
    }

    #[test]
    fn parse_remote_url_from_config() {
        let config = "\
[core]
\trepositoryformatversion = 0
[remote \"origin\"]
\turl = git@github.com:me/site.git
\tfetch = +refs/heads/*:refs/remotes/origin/*
";
        assert_eq!(
            parse_remote_url(config).as_deref(),
            Some("git@github.com:me/site.git")
        );
    }

    #[test]
    fn parse_remote_url_ignores_similar_keys() {
        assert_eq!(parse_remote_url("[remote \"o\"]\n\tpushurl = x\n"), None);
        assert_eq!(parse_remote_url(""), None);
    }

    #[tokio::test]
    async fn detect_repo_url_without_repo() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!has_git_dir(tmp.path()).await);
        assert_eq!(detect_repo_url(tmp.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn git_file_counts_as_repository() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(".git"), "gitdir: /srv/main/.git/worktrees/wt\n").unwrap();
        assert!(has_git_dir(tmp.path()).await);
    }

    #[tokio::test]
    async fn detect_repo_url_reads_git_config() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path().join(".git");
        std::fs::create_dir(&git_dir).unwrap();
        std::fs::write(
            git_dir.join("config"),
            "[remote \"origin\"]\n\turl = https://example.com/r.git\n",
        )
        .unwrap();

        assert!(has_git_dir(tmp.path()).await);
        assert_eq!(
            detect_repo_url(tmp.path()).await.unwrap().as_deref(),
            Some("https://example.com/r.git")
        );
    }
}
