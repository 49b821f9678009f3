use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::store::load_document;
use crate::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub git: CheckResult,
    pub store: CheckResult,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    fn healthy(detail: Option<String>) -> Self {
        Self { ok: true, detail }
    }

    fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

async fn check_git(state: &AppState) -> CheckResult {
    // `--version` does not need a repository; run it from the temp dir.
    let cwd = std::env::temp_dir();
    match state.runner.run(&cwd, &["--version"]).await {
        Ok(out) if out.is_success() => CheckResult::healthy(Some(out.stdout)),
        Ok(out) => CheckResult::unhealthy(out.error.unwrap_or_default()),
        Err(e) => CheckResult::unhealthy(format!("{e:#}")),
    }
}

/// A missing project file is fine (first run); an unreadable one is not.
async fn check_store(path: &Path) -> CheckResult {
    match load_document(path).await {
        Ok(doc) => CheckResult::healthy(Some(format!("{} projects", doc.projects.len()))),
        Err(e) => CheckResult::unhealthy(format!("{e:#}")),
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// `GET /healthz`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (git, store) = tokio::join!(check_git(&state), check_store(state.store.path()));

    let status = if git.ok && store.ok {
        HealthStatus::Ok
    } else {
        HealthStatus::Unhealthy
    };

    let code = match status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            checks: HealthChecks { git, store },
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
