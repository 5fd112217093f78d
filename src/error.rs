//! Error types for newscrawl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Crawl, Database, Site)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for newscrawl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newscrawl
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "crawl.batch_size")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Crawl orchestration error
    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Origin-site fetch or parse error
    #[error("site error: {0}")]
    Site(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Crawl orchestration errors
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Page range is invalid or exceeds the per-task limit
    #[error("invalid page range {start_page}-{end_page}: {reason}")]
    InvalidPageRange {
        /// First page of the requested range
        start_page: u32,
        /// Last page of the requested range
        end_page: u32,
        /// Why the range was rejected
        reason: String,
    },

    /// The origin site rejected the session credential mid-crawl
    ///
    /// Fatal for the session: credentials must be refreshed out-of-band and
    /// a new start/resume issued.
    #[error("origin site requires authentication (page {page})")]
    AuthRequired {
        /// The listing page on which the auth wall was detected
        page: u32,
    },

    /// Session not found in storage
    #[error("session {id} not found")]
    SessionNotFound {
        /// The session ID that was not found
        id: i64,
    },

    /// Cannot perform operation in the session's current state
    #[error("cannot {operation} session {id} in state {current_state}")]
    InvalidState {
        /// The session ID that is in an invalid state for the operation
        id: i64,
        /// The operation that was attempted (e.g., "pause", "resume")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs. It
/// follows a standard format with machine-readable error codes and
/// human-readable messages.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "session_not_found",
///     "message": "session 123 not found"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "session_not_found")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Crawl(CrawlError::InvalidPageRange { .. }) => 400,

            // 401 Unauthorized - origin credential rejected
            Error::Crawl(CrawlError::AuthRequired { .. }) => 401,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Crawl(CrawlError::SessionNotFound { .. }) => 404,

            // 409 Conflict - session not in a state that allows the operation
            Error::Crawl(CrawlError::InvalidState { .. }) => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Site(_) => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Crawl(e) => match e {
                CrawlError::InvalidPageRange { .. } => "invalid_page_range",
                CrawlError::AuthRequired { .. } => "auth_required",
                CrawlError::SessionNotFound { .. } => "session_not_found",
                CrawlError::InvalidState { .. } => "invalid_state",
            },
            Error::Site(_) => "site_error",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Crawl(CrawlError::SessionNotFound { id }) => Some(serde_json::json!({
                "session_id": id,
            })),
            Error::Crawl(CrawlError::InvalidState {
                id,
                operation,
                current_state,
            }) => Some(serde_json::json!({
                "session_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            Error::Crawl(CrawlError::InvalidPageRange {
                start_page,
                end_page,
                ..
            }) => Some(serde_json::json!({
                "start_page": start_page,
                "end_page": end_page,
            })),
            Error::Crawl(CrawlError::AuthRequired { page }) => Some(serde_json::json!({
                "page": page,
            })),
            _ => None,
        };

        Self {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
