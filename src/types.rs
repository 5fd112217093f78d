//! Core types for newscrawl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a crawl session
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<SessionId> for i64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for SessionId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for SessionId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for SessionId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Crawl session status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Session task is running
    Running,
    /// Paused by user
    Paused,
    /// Successfully completed
    Completed,
    /// Failed with error
    Failed,
}

impl Status {
    /// Convert integer status code to Status enum
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => Status::Running,
            1 => Status::Paused,
            2 => Status::Completed,
            3 => Status::Failed,
            _ => Status::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert Status enum to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            Status::Running => 0,
            Status::Paused => 1,
            Status::Completed => 2,
            Status::Failed => 3,
        }
    }

    /// Whether this is a terminal status (completed or failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

/// Crawl phase within a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Walking paginated listing pages, discovering article stubs
    List,
    /// Fetching full article content for pending stubs
    Detail,
    /// All pending articles drained
    Completed,
}

impl Phase {
    /// Convert integer phase code to Phase enum
    pub fn from_i32(phase: i32) -> Self {
        match phase {
            0 => Phase::List,
            1 => Phase::Detail,
            2 => Phase::Completed,
            _ => Phase::List, // Default to List for unknown phase
        }
    }

    /// Convert Phase enum to integer phase code
    pub fn to_i32(&self) -> i32 {
        match self {
            Phase::List => 0,
            Phase::Detail => 1,
            Phase::Completed => 2,
        }
    }
}

/// Article stub discovered on a listing page (list-phase data)
///
/// Carries only the fields visible on the listing page. The detail phase
/// overwrites the row with the full [`ArticleDetail`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArticleStub {
    /// The origin site's own article identifier (natural key)
    pub source_id: String,
    /// Absolute URL of the article detail page
    pub source_url: String,
    /// Article title as shown on the listing page
    pub title: String,
    /// Category label from the listing page
    pub category: String,
    /// Publish time, if the listing value could be parsed
    pub publish_time: Option<DateTime<Utc>>,
    /// Site-reported editorial status (e.g. approved / under review)
    pub site_status: String,
}

/// Fully parsed article from a detail page (detail-phase data)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArticleDetail {
    /// The origin site's own article identifier (natural key)
    pub source_id: String,
    /// Article title
    pub title: String,
    /// Article body as HTML
    pub content_html: String,
    /// Article body as plain text (scripts/styles stripped)
    pub content_text: String,
    /// Author extracted from the article body
    pub author: String,
    /// Publication source name
    pub source_name: String,
    /// Category label
    pub category: String,
    /// Region derived from the title
    pub region: String,
    /// Publish time, if parseable
    pub publish_time: Option<DateTime<Utc>>,
}

/// Result of fetching and parsing one listing page
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage {
    /// Page number that was fetched
    pub page: u32,
    /// Total article count reported by the site's pager
    pub total_count: u64,
    /// Article stubs parsed from the page, in page order
    pub articles: Vec<ArticleStub>,
}

/// Point-in-time progress snapshot for a crawl session
///
/// Returned by `start` and the status query. All counters come from the
/// persisted session row; nothing here is derived from in-flight work.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    /// Session identifier
    pub session_id: SessionId,
    /// Current session status
    pub status: Status,
    /// Current crawl phase
    pub phase: Phase,
    /// Pages processed so far, relative to this task's range (1-based)
    pub current_page: u32,
    /// Total pages in this task's range
    pub total_pages: u32,
    /// Articles discovered and inserted by the list phase
    pub total_news: u64,
    /// Articles still pending a detail fetch
    pub pending_news: u64,
    /// Articles successfully crawled
    pub crawled_news: u64,
    /// Articles whose detail fetch failed
    pub failed_news: u64,
    /// Average crawl speed in articles per minute
    pub avg_speed: f64,
    /// Estimated minutes remaining (0 unless in detail phase with speed > 0)
    pub estimated_minutes: u64,
    /// When the session was started
    pub started_at: DateTime<Utc>,
    /// When the session reached a terminal status, if it has
    pub finished_at: Option<DateTime<Utc>>,
}

/// Global article counts by status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewsStats {
    /// Total article rows
    pub total: u64,
    /// Articles awaiting a detail fetch
    pub pending: u64,
    /// Articles successfully crawled
    pub crawled: u64,
    /// Articles whose detail fetch failed
    pub failed: u64,
}

/// Event emitted during the crawl lifecycle
///
/// Events are broadcast to all subscribers; if nobody is listening they are
/// silently dropped. The session row remains the source of truth — events
/// exist for UI push, not for state reconstruction.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A crawl session was started
    SessionStarted {
        /// Session ID
        id: SessionId,
        /// Display name of the session
        name: String,
        /// Total pages in the task range
        total_pages: u32,
    },

    /// A listing page was fetched and its stubs inserted
    ListPageCrawled {
        /// Session ID
        id: SessionId,
        /// Absolute page number on the origin site
        page: u32,
        /// Number of newly inserted article stubs
        inserted: u64,
    },

    /// An article detail was fetched and persisted
    ArticleCrawled {
        /// Session ID
        id: SessionId,
        /// The article's natural key
        source_id: String,
    },

    /// An article detail fetch failed and the article was marked failed
    ArticleFailed {
        /// Session ID
        id: SessionId,
        /// The article's natural key
        source_id: String,
        /// Error message recorded on the article row
        error: String,
    },

    /// A detail batch finished and progress was persisted
    BatchCompleted {
        /// Session ID
        id: SessionId,
        /// Articles crawled so far in this session run
        crawled: u64,
        /// Articles failed so far in this session run
        failed: u64,
        /// Current average speed in articles per minute
        avg_speed: f64,
    },

    /// The session was paused
    SessionPaused {
        /// Session ID
        id: SessionId,
    },

    /// The session was resumed
    SessionResumed {
        /// Session ID
        id: SessionId,
    },

    /// The session completed (pending set drained)
    SessionCompleted {
        /// Session ID
        id: SessionId,
        /// Articles crawled in this session run
        crawled: u64,
        /// Articles failed in this session run
        failed: u64,
    },

    /// The session failed
    SessionFailed {
        /// Session ID
        id: SessionId,
        /// Error message
        error: String,
    },
}
