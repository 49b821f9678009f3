//! On-disk JSON document holding the project list.
//!
//! The whole document is rewritten on every save.  Writes go to a sibling
//! `.tmp` file which is then renamed over the target, so a crash mid-write
//! leaves the previous document intact.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A stored pairing of a local working tree and its remote URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub local_path: String,
    pub repo_url: String,
}

/// Top-level shape of `git_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Read the document at `path`, or an empty one if the file does not exist.
///
/// Malformed JSON is an error; it is never replaced by an empty document.
pub async fn load_document(path: &Path) -> Result<ConfigDocument> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "project file missing; starting empty");
            return Ok(ConfigDocument::default());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read project file: {}", path.display()))
        }
    };

    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse project file: {}", path.display()))
}

/// Atomically replace the document at `path` with `doc`.
pub async fn save_document(path: &Path, doc: &ConfigDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let body = to_pretty_json(doc)?;

    let tmp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("create temp file {}", tmp_path.display()))?;
    file.write_all(&body)
        .await
        .context("write project document to temp file")?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename {} → {}", tmp_path.display(), path.display()))?;

    debug!(path = %path.display(), projects = doc.projects.len(), "project file written");
    Ok(())
}

/// Pretty-print with 4-space indentation.
fn to_pretty_json(doc: &ConfigDocument) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)
        .context("failed to serialize project document")?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn project(path: &str, url: &str) -> Project {
        Project {
            local_path: path.to_string(),
            repo_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = load_document(&tmp.path().join("git_config.json"))
            .await
            .unwrap();
        assert!(doc.projects.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("git_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_document(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse project file"));
    }

    #[tokio::test]
    async fn missing_projects_key_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("git_config.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(load_document(&path).await.unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_reproduces_projects() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("git_config.json");
        let doc = ConfigDocument {
            projects: vec![
                project("/home/me/site", "git@github.com:me/site.git"),
                project("/home/me/notes", "https://github.com/me/notes.git"),
                project("C:\\work\\ünïcode", ""),
            ],
        };

        save_document(&path, &doc).await.unwrap();
        let loaded = load_document(&path).await.unwrap();
        save_document(&path, &loaded).await.unwrap();

        assert_eq!(load_document(&path).await.unwrap(), doc);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn save_uses_four_space_indent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("git_config.json");
        let doc = ConfigDocument {
            projects: vec![project("/a", "b")],
        };
        save_document(&path, &doc).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"projects\": ["));
        assert!(text.contains("\n            \"local_path\": \"/a\""));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("dir").join("projects.json");
        save_document(&path, &ConfigDocument::default()).await.unwrap();
        assert!(path.is_file());
    }
}
