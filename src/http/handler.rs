//! axum router and request handlers for the dashboard.
//!
//! Routes:
//! - `GET  /`        - Render the form (optionally pre-filled via `?project=<i>`)
//! - `POST /`        - Save a project or run the push sequence
//! - `GET  /healthz` - Health check

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use super::page::{self, PageView};
use crate::git::{detect_repo_url, effective_commit_message, PushOutcome, PushSequence};
use crate::store::{IndexOutOfRange, Project, ProjectChoice};
use crate::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the axum [`Router`] with all HTTP routes and shared state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index).post(handle_submit))
        .route("/healthz", get(crate::health::health_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    project: Option<String>,
}

/// Fields posted by the dashboard form.  Everything defaults to empty so
/// missing fields are reported as a 400 with a readable reason.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitForm {
    project: String,
    local_path: String,
    repo_url: String,
    commit_message: String,
    action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
    Save,
    Push,
}

impl FormAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "save" => Some(Self::Save),
            "push" => Some(Self::Push),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`
async fn handle_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let projects = state.store.projects().await?;

    let selected = query
        .project
        .as_deref()
        .and_then(ProjectChoice::parse)
        .and_then(ProjectChoice::index)
        .filter(|&i| i < projects.len());

    let (local_path, repo_url) = selected
        .map(|i| (projects[i].local_path.as_str(), projects[i].repo_url.as_str()))
        .unwrap_or_default();

    Ok(Html(page::render(&PageView {
        projects: &projects,
        selected,
        local_path,
        repo_url,
        message: None,
    })))
}

/// `POST /`
///
/// `action=save` upserts the project and persists it.  `action=push` runs
/// the push sequence against the submitted path and URL without touching
/// the stored list.  Any other action re-renders the form with no message.
#[instrument(skip(state, form), fields(action = %form.action, project = %form.project))]
async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubmitForm>,
) -> Result<Html<String>, AppError> {
    let Some(action) = FormAction::parse(&form.action) else {
        debug!("unrecognised action; re-rendering form");
        let projects = state.store.projects().await?;
        let selected = ProjectChoice::parse(&form.project)
            .and_then(ProjectChoice::index)
            .filter(|&i| i < projects.len());
        return Ok(Html(page::render(&PageView {
            projects: &projects,
            selected,
            local_path: form.local_path.trim(),
            repo_url: form.repo_url.trim(),
            message: None,
        })));
    };
    let choice = ProjectChoice::parse(&form.project).ok_or_else(|| {
        AppError::BadRequest(format!("invalid project selection: {:?}", form.project))
    })?;

    let local_path = form.local_path.trim().to_string();
    if local_path.is_empty() {
        return Err(AppError::BadRequest("local_path is required".into()));
    }

    let mut repo_url = form.repo_url.trim().to_string();
    if repo_url.is_empty() {
        match detect_repo_url(Path::new(&local_path)).await {
            Ok(Some(detected)) => {
                info!(%detected, "using remote url from existing repository");
                repo_url = detected;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %format!("{e:#}"), "remote url detection failed; keeping it blank");
            }
        }
    }

    let (message, selected) = match action {
        FormAction::Save => {
            let project = Project {
                local_path: local_path.clone(),
                repo_url: repo_url.clone(),
            };
            let index = state
                .store
                .upsert(choice, project)
                .await
                .map_err(AppError::from_store)?;
            (page::saved_message(), Some(index))
        }
        FormAction::Push => {
            let path = Path::new(&local_path);
            if !tokio::fs::metadata(path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
            {
                return Err(AppError::BadRequest(format!(
                    "local path is not a directory: {local_path}"
                )));
            }

            let commit_message = effective_commit_message(&form.commit_message);
            let outcome = PushSequence::new(state.runner.as_ref(), &state.config.git)
                .run(path, &repo_url, &commit_message)
                .await?;

            let message = match outcome {
                PushOutcome::Pushed { output } => {
                    info!(path = %local_path, "push succeeded");
                    page::push_success_message(&output)
                }
                PushOutcome::Failed { step, stderr } => {
                    warn!(path = %local_path, %step, "push failed");
                    page::push_error_message(step.name(), &stderr)
                }
            };
            (message, choice.index())
        }
    };

    let projects = state.store.projects().await?;
    let selected = selected.filter(|&i| i < projects.len());

    Ok(Html(page::render(&PageView {
        projects: &projects,
        selected,
        local_path: &local_path,
        repo_url: &repo_url,
        message: Some(message),
    })))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Application-level error type that maps cleanly to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The submitted form cannot be acted on.
    BadRequest(String),
    /// An unexpected internal error.
    Internal(anyhow::Error),
}

impl AppError {
    /// Out-of-range indices are the caller's fault; anything else from the
    /// store is internal.
    fn from_store(err: anyhow::Error) -> Self {
        match err.downcast_ref::<IndexOutOfRange>() {
            Some(e) => AppError::BadRequest(e.to_string()),
            None => AppError::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                warn!(%msg, "rejected request");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            AppError::Internal(err) => {
                error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {err:#}"),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
