//! Crawl session CRUD and partial progress updates.

use crate::error::DatabaseError;
use crate::types::{Phase, SessionId, Status};
use crate::{Error, Result};

use super::{CrawlSessionRow, Database, SessionUpdate};

impl Database {
    /// Create a new crawl session row
    ///
    /// The session starts in status=running, phase=list with zeroed counters.
    pub async fn create_session(&self, name: &str, total_pages: u32) -> Result<SessionId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO crawl_sessions (
                session_name, total_pages, current_page, phase, status,
                total_news, pending_news, crawled_news, failed_news,
                avg_speed, started_at
            ) VALUES (?, ?, 0, ?, ?, 0, 0, 0, 0, 0, ?)
            "#,
        )
        .bind(name)
        .bind(total_pages)
        .bind(Phase::List.to_i32())
        .bind(Status::Running.to_i32())
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to create crawl session: {}",
                e
            )))
        })?;

        Ok(SessionId(result.last_insert_rowid()))
    }

    /// Get a crawl session row by ID
    pub async fn get_session(&self, id: SessionId) -> Result<Option<CrawlSessionRow>> {
        let row = sqlx::query_as::<_, CrawlSessionRow>(
            r#"
            SELECT id, session_name, total_pages, current_page, phase, status,
                   total_news, pending_news, crawled_news, failed_news,
                   avg_speed, started_at, finished_at
            FROM crawl_sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get crawl session: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Apply a partial update to a crawl session row
    ///
    /// Only fields set in `update` are written. When `status` transitions to
    /// a terminal value, `finished_at` is stamped — but never overwritten on
    /// a later update, so it is set exactly once per session.
    pub async fn update_session(&self, id: SessionId, update: &SessionUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut query_builder = sqlx::QueryBuilder::new("UPDATE crawl_sessions SET ");
        let mut first = true;

        macro_rules! push_field {
            ($name:literal, $value:expr) => {
                if let Some(value) = $value {
                    if !first {
                        query_builder.push(", ");
                    }
                    query_builder.push(concat!($name, " = "));
                    query_builder.push_bind(value);
                    first = false;
                }
            };
        }

        push_field!("current_page", update.current_page);
        push_field!("phase", update.phase);
        push_field!("status", update.status);
        push_field!("total_news", update.total_news);
        push_field!("pending_news", update.pending_news);
        push_field!("crawled_news", update.crawled_news);
        push_field!("failed_news", update.failed_news);
        push_field!("avg_speed", update.avg_speed);

        // Terminal transition stamps finished_at, exactly once
        if let Some(status) = update.status {
            if Status::from_i32(status).is_terminal() {
                query_builder.push(", finished_at = COALESCE(finished_at, ");
                query_builder.push_bind(chrono::Utc::now().timestamp());
                query_builder.push(")");
            }
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);

        query_builder
            .build()
            .execute(self.pool())
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update crawl session: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// List sessions, most recently started first
    pub async fn list_sessions(&self, limit: u32) -> Result<Vec<CrawlSessionRow>> {
        let rows = sqlx::query_as::<_, CrawlSessionRow>(
            r#"
            SELECT id, session_name, total_pages, current_page, phase, status,
                   total_news, pending_news, crawled_news, failed_news,
                   avg_speed, started_at, finished_at
            FROM crawl_sessions
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list crawl sessions: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
