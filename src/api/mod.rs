//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API the crawl dashboard drives:
//! session control, status polling, failed-article retry, and statistics.

use crate::{Config, NewsCrawler, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Crawl Sessions
/// - `POST /crawl/start` - Start a new crawl session
/// - `GET /crawl/sessions` - List recent sessions
/// - `GET /crawl/sessions/:id` - Poll one session's progress
/// - `POST /crawl/sessions/:id/pause` - Pause a running session
/// - `POST /crawl/sessions/:id/resume` - Resume a paused session
/// - `POST /crawl/retry-failed` - Reset all failed articles to pending
///
/// ## System
/// - `GET /stats` - Global article counts by status
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(crawler: Arc<NewsCrawler>, config: Arc<Config>) -> Router {
    let state = AppState::new(crawler, config.clone());

    let router = Router::new()
        // Crawl Sessions
        .route("/crawl/start", post(routes::start_crawl))
        .route("/crawl/sessions", get(routes::list_sessions))
        .route("/crawl/sessions/:id", get(routes::session_status))
        .route("/crawl/sessions/:id/pause", post(routes::pause_session))
        .route("/crawl/sessions/:id/resume", post(routes::resume_session))
        .route("/crawl/retry-failed", post(routes::retry_failed))
        // System
        .route("/stats", get(routes::news_stats))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI serves its own copy of the spec at /api-docs/openapi.json so it
    // does not collide with the /openapi.json route above.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Add state to all routes
    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Origins may include "*" to allow any origin (the default for local
/// dashboard development).
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves
/// the API router until the server is shut down.
pub async fn start_api_server(crawler: Arc<NewsCrawler>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(crawler, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
