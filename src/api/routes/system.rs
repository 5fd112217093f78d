//! System handlers: health, stats, OpenAPI, events.

use crate::api::AppState;
use crate::error::{ApiError, Error};
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /stats - Global article counts by status
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses(
        (status = 200, description = "Article counts by status", body = crate::types::NewsStats),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn news_stats(
    State(state): State<AppState>,
) -> Result<Json<crate::types::NewsStats>, Error> {
    let stats = state.crawler.stats().await?;
    Ok(Json(stats))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.crawler.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => {
                let event_type = match &event {
                    crate::types::Event::SessionStarted { .. } => "session_started",
                    crate::types::Event::ListPageCrawled { .. } => "list_page_crawled",
                    crate::types::Event::ArticleCrawled { .. } => "article_crawled",
                    crate::types::Event::ArticleFailed { .. } => "article_failed",
                    crate::types::Event::BatchCompleted { .. } => "batch_completed",
                    crate::types::Event::SessionPaused { .. } => "session_paused",
                    crate::types::Event::SessionResumed { .. } => "session_resumed",
                    crate::types::Event::SessionCompleted { .. } => "session_completed",
                    crate::types::Event::SessionFailed { .. } => "session_failed",
                };

                Some(Ok(SseEvent::default().event(event_type).data(json_data)))
            }
            Err(e) => {
                tracing::warn!("Failed to serialize event to JSON: {}", e);
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("SSE client lagged, skipped {} events", skipped);
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
