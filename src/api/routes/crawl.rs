//! Crawl session handlers: start, pause, resume, status, retry.

use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::SessionId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

/// Request body for starting a crawl session
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartCrawlRequest {
    /// First listing page (1-based, inclusive)
    pub start_page: u32,
    /// Last listing page (inclusive)
    pub end_page: u32,
    /// Drop stubs whose natural key already has a row (default: true)
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
    /// Origin-site session cookie
    pub cookie: String,
}

fn default_skip_existing() -> bool {
    true
}

/// Request body carrying a fresh origin-site credential
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResumeRequest {
    /// Origin-site session cookie
    pub cookie: String,
}

/// Query parameters for session listing
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Maximum sessions to return (default: 20)
    #[serde(default = "default_sessions_limit")]
    pub limit: u32,
}

fn default_sessions_limit() -> u32 {
    20
}

/// POST /crawl/start - Start a new crawl session
#[utoipa::path(
    post,
    path = "/crawl/start",
    tag = "crawl",
    request_body = StartCrawlRequest,
    responses(
        (status = 200, description = "Session created and crawl launched", body = crate::types::CrawlProgress),
        (status = 400, description = "Invalid page range", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn start_crawl(
    State(state): State<AppState>,
    Json(request): Json<StartCrawlRequest>,
) -> Result<Json<crate::types::CrawlProgress>, Error> {
    let progress = state
        .crawler
        .start(
            request.start_page,
            request.end_page,
            request.skip_existing,
            &request.cookie,
        )
        .await?;

    Ok(Json(progress))
}

/// GET /crawl/sessions - List recent sessions
#[utoipa::path(
    get,
    path = "/crawl/sessions",
    tag = "crawl",
    params(
        ("limit" = Option<u32>, Query, description = "Maximum sessions to return (default 20)")
    ),
    responses(
        (status = 200, description = "Recent sessions, most recently started first", body = Vec<crate::types::CrawlProgress>),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<crate::types::CrawlProgress>>, Error> {
    let sessions = state.crawler.sessions(query.limit).await?;
    Ok(Json(sessions))
}

/// GET /crawl/sessions/:id - Poll one session's progress
#[utoipa::path(
    get,
    path = "/crawl/sessions/{id}",
    tag = "crawl",
    params(
        ("id" = i64, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Point-in-time progress snapshot", body = crate::types::CrawlProgress),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn session_status(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.crawler.status(SessionId(id)).await {
        Ok(Some(progress)) => (StatusCode::OK, Json(progress)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("session {}", id))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /crawl/sessions/:id/pause - Pause a running session
#[utoipa::path(
    post,
    path = "/crawl/sessions/{id}/pause",
    tag = "crawl",
    params(
        ("id" = i64, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session paused"),
        (status = 409, description = "Session is not running", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn pause_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, Error> {
    state.crawler.pause(SessionId(id)).await?;
    Ok(Json(json!({
        "success": true,
        "message": "session paused"
    })))
}

/// POST /crawl/sessions/:id/resume - Resume a paused session
///
/// The caller is expected to have re-validated the credential against the
/// origin site before invoking.
#[utoipa::path(
    post,
    path = "/crawl/sessions/{id}/resume",
    tag = "crawl",
    params(
        ("id" = i64, Path, description = "Session ID")
    ),
    request_body = ResumeRequest,
    responses(
        (status = 200, description = "Session resumed"),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session is not paused", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn resume_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    state.crawler.resume(SessionId(id), &request.cookie).await?;
    Ok(Json(json!({
        "success": true,
        "message": "session resumed"
    })))
}

/// POST /crawl/retry-failed - Reset all failed articles to pending
#[utoipa::path(
    post,
    path = "/crawl/retry-failed",
    tag = "crawl",
    responses(
        (status = 200, description = "Failed articles reset; count returned"),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn retry_failed(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, Error> {
    let count = state.crawler.retry_failed().await?;
    Ok(Json(json!({ "count": count })))
}
