//! Database layer for newscrawl
//!
//! Handles SQLite persistence for articles and crawl sessions.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`articles`] — Article upsert, status updates, pending queries
//! - [`sessions`] — Crawl session CRUD and partial progress updates

use sqlx::{FromRow, sqlite::SqlitePool};

mod articles;
mod migrations;
mod sessions;

/// Article status constants
pub mod article_status {
    /// Discovered by the list phase, detail not yet fetched
    pub const PENDING: i32 = 0;
    /// Detail successfully fetched and persisted
    pub const CRAWLED: i32 = 1;
    /// Detail fetch or parse failed
    pub const FAILED: i32 = 2;
}

/// Article record from database
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    /// Unique database ID
    pub id: i64,
    /// The origin site's own article identifier (natural key, unique)
    pub source_id: String,
    /// Article title
    pub title: String,
    /// Absolute URL of the article detail page
    pub source_url: String,
    /// Category label
    pub category: Option<String>,
    /// Region derived from the title (detail pass)
    pub region: Option<String>,
    /// Author extracted from the body (detail pass)
    pub author: Option<String>,
    /// Publication source name (detail pass)
    pub source_name: Option<String>,
    /// Article body as HTML (detail pass)
    pub content: Option<String>,
    /// Article body as plain text (detail pass)
    pub content_text: Option<String>,
    /// Publish time as Unix timestamp
    pub publish_time: Option<i64>,
    /// Article status (see [`article_status`])
    pub status: i32,
    /// Error message from the last failed detail fetch
    pub error_message: Option<String>,
    /// Unix timestamp when the detail was successfully crawled
    pub crawl_time: Option<i64>,
    /// Unix timestamp when the stub was inserted
    pub created_at: i64,
}

/// Pending-article descriptor handed to the detail pool
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingArticle {
    /// The article's natural key
    pub source_id: String,
    /// Absolute URL of the article detail page
    pub source_url: String,
}

/// Crawl session record from database
#[derive(Debug, Clone, FromRow)]
pub struct CrawlSessionRow {
    /// Unique database ID
    pub id: i64,
    /// Display name for this session
    pub session_name: String,
    /// Total pages in the task's range
    pub total_pages: i64,
    /// Pages processed so far, relative to the task's range
    pub current_page: i64,
    /// Crawl phase (see [`crate::types::Phase`])
    pub phase: i32,
    /// Session status (see [`crate::types::Status`])
    pub status: i32,
    /// Articles discovered and inserted by the list phase
    pub total_news: i64,
    /// Articles still pending a detail fetch
    pub pending_news: i64,
    /// Articles successfully crawled
    pub crawled_news: i64,
    /// Articles whose detail fetch failed
    pub failed_news: i64,
    /// Average crawl speed in articles per minute
    pub avg_speed: f64,
    /// Unix timestamp when the session was started
    pub started_at: i64,
    /// Unix timestamp when the session reached a terminal status
    pub finished_at: Option<i64>,
}

/// Partial update for a crawl session row
///
/// Only fields set to `Some` are written. Setting `status` to a terminal
/// value also stamps `finished_at`, once.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    /// New relative page counter
    pub current_page: Option<i64>,
    /// New crawl phase
    pub phase: Option<i32>,
    /// New session status
    pub status: Option<i32>,
    /// New discovered-article total
    pub total_news: Option<i64>,
    /// New pending count
    pub pending_news: Option<i64>,
    /// New crawled count
    pub crawled_news: Option<i64>,
    /// New failed count
    pub failed_news: Option<i64>,
    /// New average speed (articles/minute)
    pub avg_speed: Option<f64>,
}

impl SessionUpdate {
    /// Whether this update writes anything at all
    pub fn is_empty(&self) -> bool {
        self.current_page.is_none()
            && self.phase.is_none()
            && self.status.is_none()
            && self.total_news.is_none()
            && self.pending_news.is_none()
            && self.crawled_news.is_none()
            && self.failed_news.is_none()
            && self.avg_speed.is_none()
    }
}

/// Database handle for newscrawl
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
