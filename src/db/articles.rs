//! Article operations — idempotent stub upsert, detail updates, pending queries.

use crate::error::DatabaseError;
use crate::types::{ArticleDetail, ArticleStub, NewsStats};
use crate::{Error, Result};
use std::collections::HashSet;

use super::{Article, Database, PendingArticle, article_status};

impl Database {
    /// Insert article stubs discovered by the list phase
    ///
    /// Idempotent on the natural key: stubs whose `source_id` already exists
    /// are silently skipped. Returns the number of newly inserted rows.
    ///
    /// Automatically chunks the input to stay within SQLite's bind variable
    /// limit (6 variables per stub, chunked to max 166 stubs per INSERT).
    pub async fn insert_stubs(&self, stubs: &[ArticleStub]) -> Result<u64> {
        if stubs.is_empty() {
            return Ok(0);
        }

        // SQLite default SQLITE_MAX_VARIABLE_NUMBER is 999.
        // Each stub uses 6 bind variables, so max 166 stubs per batch.
        const MAX_STUBS_PER_BATCH: usize = 166;

        let now = chrono::Utc::now().timestamp();
        let mut inserted = 0u64;

        for chunk in stubs.chunks(MAX_STUBS_PER_BATCH) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT OR IGNORE INTO news (source_id, title, source_url, category, publish_time, status, created_at) ",
            );

            query_builder.push_values(chunk, |mut b, stub| {
                b.push_bind(&stub.source_id)
                    .push_bind(&stub.title)
                    .push_bind(&stub.source_url)
                    .push_bind(&stub.category)
                    .push_bind(stub.publish_time.map(|t| t.timestamp()))
                    .push_bind(article_status::PENDING)
                    .push_bind(now);
            });

            let query = query_builder.build();
            let result = query.execute(self.pool()).await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert article stubs: {}",
                    e
                )))
            })?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Return which of the given natural keys already have a row
    ///
    /// Automatically chunks the input to stay within SQLite's bind variable limit.
    pub async fn existing_ids(&self, source_ids: &[String]) -> Result<HashSet<String>> {
        if source_ids.is_empty() {
            return Ok(HashSet::new());
        }

        const MAX_IDS_PER_QUERY: usize = 900;

        let mut existing = HashSet::new();

        for chunk in source_ids.chunks(MAX_IDS_PER_QUERY) {
            let mut query_builder =
                sqlx::QueryBuilder::new("SELECT source_id FROM news WHERE source_id IN (");

            let mut first = true;
            for source_id in chunk {
                if !first {
                    query_builder.push(", ");
                }
                query_builder.push_bind(source_id);
                first = false;
            }
            query_builder.push(")");

            let rows: Vec<(String,)> = query_builder
                .build_query_as()
                .fetch_all(self.pool())
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query existing article ids: {}",
                        e
                    )))
                })?;

            existing.extend(rows.into_iter().map(|(id,)| id));
        }

        Ok(existing)
    }

    /// Overwrite an article row with its fully fetched detail
    ///
    /// Marks the article crawled and stamps the crawl time. The row is looked
    /// up by natural key; a detail for an unknown key is a silent no-op.
    pub async fn update_article_detail(&self, detail: &ArticleDetail) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE news
            SET title = ?, content = ?, content_text = ?, author = ?,
                source_name = ?, category = ?, region = ?, publish_time = ?,
                status = ?, crawl_time = ?, error_message = NULL
            WHERE source_id = ?
            "#,
        )
        .bind(&detail.title)
        .bind(&detail.content_html)
        .bind(&detail.content_text)
        .bind(&detail.author)
        .bind(&detail.source_name)
        .bind(&detail.category)
        .bind(&detail.region)
        .bind(detail.publish_time.map(|t| t.timestamp()))
        .bind(article_status::CRAWLED)
        .bind(now)
        .bind(&detail.source_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update article detail: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Mark an article's detail fetch as failed, recording the error message
    pub async fn mark_article_failed(&self, source_id: &str, message: &str) -> Result<()> {
        sqlx::query("UPDATE news SET status = ?, error_message = ? WHERE source_id = ?")
            .bind(article_status::FAILED)
            .bind(message)
            .bind(source_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to mark article failed: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Get up to `limit` pending articles, oldest first
    pub async fn get_pending_articles(&self, limit: u32) -> Result<Vec<PendingArticle>> {
        let rows = sqlx::query_as::<_, PendingArticle>(
            r#"
            SELECT source_id, source_url
            FROM news
            WHERE status = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(article_status::PENDING)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get pending articles: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Count articles awaiting a detail fetch
    pub async fn count_pending(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news WHERE status = ?")
            .bind(article_status::PENDING)
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count pending articles: {}",
                    e
                )))
            })?;

        Ok(count as u64)
    }

    /// Reset every failed article back to pending, clearing its error message
    ///
    /// Not session-scoped: applies across all sessions' failed articles.
    /// Returns the number of rows affected.
    pub async fn retry_all_failed(&self) -> Result<u64> {
        let result =
            sqlx::query("UPDATE news SET status = ?, error_message = NULL WHERE status = ?")
                .bind(article_status::PENDING)
                .bind(article_status::FAILED)
                .execute(self.pool())
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to reset failed articles: {}",
                        e
                    )))
                })?;

        Ok(result.rows_affected())
    }

    /// Get an article row by its natural key
    pub async fn get_article_by_source_id(&self, source_id: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, source_id, title, source_url, category, region, author,
                   source_name, content, content_text, publish_time, status,
                   error_message, crawl_time, created_at
            FROM news
            WHERE source_id = ?
            "#,
        )
        .bind(source_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get article: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Global article counts by status
    pub async fn news_stats(&self) -> Result<NewsStats> {
        let rows: Vec<(i32, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM news GROUP BY status")
                .fetch_all(self.pool())
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query news stats: {}",
                        e
                    )))
                })?;

        let mut stats = NewsStats {
            total: 0,
            pending: 0,
            crawled: 0,
            failed: 0,
        };
        for (status, count) in rows {
            let count = count as u64;
            stats.total += count;
            match status {
                article_status::PENDING => stats.pending = count,
                article_status::CRAWLED => stats.crawled = count,
                article_status::FAILED => stats.failed = count,
                _ => {}
            }
        }

        Ok(stats)
    }
}
