//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the newscrawl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the newscrawl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "newscrawl REST API",
        version = "0.2.0",
        description = "REST API for controlling resumable two-phase news crawl sessions",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6788", description = "Local development server")
    ),
    paths(
        // Crawl Sessions
        crate::api::routes::start_crawl,
        crate::api::routes::list_sessions,
        crate::api::routes::session_status,
        crate::api::routes::pause_session,
        crate::api::routes::resume_session,
        crate::api::routes::retry_failed,

        // System
        crate::api::routes::news_stats,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(
        schemas(
            crate::types::SessionId,
            crate::types::Status,
            crate::types::Phase,
            crate::types::CrawlProgress,
            crate::types::NewsStats,
            crate::types::Event,
            crate::api::routes::StartCrawlRequest,
            crate::api::routes::ResumeRequest,
            crate::error::ApiError,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "crawl", description = "Crawl session control"),
        (name = "system", description = "Health, statistics, and events")
    )
)]
pub struct ApiDoc;
