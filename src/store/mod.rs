//! Project list persistence.
//!
//! [`ProjectStore`] is the single owner of the project file inside the
//! process.  Every read-modify-write cycle holds an async mutex, so two
//! concurrent saves cannot interleave and silently drop one another.

pub mod document;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{info, instrument};

pub use document::{load_document, save_document, Project};

// ---------------------------------------------------------------------------
// Project selection
// ---------------------------------------------------------------------------

/// Which stored project a form submission refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectChoice {
    /// Append a new entry.
    New,
    /// Replace the entry at this position.
    Index(usize),
}

impl ProjectChoice {
    /// Parse the form's `project` field: `"new"` or a decimal index.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "new" => Some(Self::New),
            other => other.parse().ok().map(Self::Index),
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Self::New => None,
            Self::Index(i) => Some(i),
        }
    }
}

/// Returned (inside `anyhow::Error`) when an update names a position past
/// the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project index {} out of range ({} stored)",
            self.index, self.len
        )
    }
}

impl std::error::Error for IndexOutOfRange {}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ProjectStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current project list, read fresh from disk.
    pub async fn projects(&self) -> Result<Vec<Project>> {
        Ok(load_document(&self.path).await?.projects)
    }

    /// Append or replace a project and persist the whole document.
    ///
    /// Returns the index the project now occupies.  An out-of-range index is
    /// an error and leaves the file untouched.
    #[instrument(skip(self, project), fields(path = %self.path.display()))]
    pub async fn upsert(&self, choice: ProjectChoice, project: Project) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut doc = load_document(&self.path).await?;
        let index = match choice {
            ProjectChoice::New => {
                doc.projects.push(project);
                doc.projects.len() - 1
            }
            ProjectChoice::Index(i) => {
                let len = doc.projects.len();
                let Some(slot) = doc.projects.get_mut(i) else {
                    return Err(IndexOutOfRange { index: i, len }.into());
                };
                *slot = project;
                i
            }
        };

        save_document(&self.path, &doc).await?;
        info!(index, total = doc.projects.len(), "project saved");
        Ok(index)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
