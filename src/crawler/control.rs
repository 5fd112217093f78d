//! Session lifecycle control — start, pause, resume, status, retry.

use crate::Result;
use crate::db::CrawlSessionRow;
use crate::error::{CrawlError, Error};
use crate::types::{CrawlProgress, Event, NewsStats, Phase, SessionId, Status};
use chrono::{TimeZone, Utc};

use super::NewsCrawler;
use super::progress;
use super::registry::RunState;
use super::task::{self, CrawlRange, CrawlTaskContext};

impl NewsCrawler {
    /// Start a new crawl session over a listing-page range
    ///
    /// Validates the range, creates the session row, registers the run
    /// state, and hands execution off to a detached task. Returns the
    /// initial progress snapshot immediately — it does not block on the
    /// crawl. Asynchronous failures after this point are only observable
    /// through [`status`](Self::status) polling.
    ///
    /// # Arguments
    ///
    /// * `start_page` - First listing page (1-based, inclusive)
    /// * `end_page` - Last listing page (inclusive)
    /// * `skip_existing` - Drop stubs whose natural key already has a row
    /// * `credential` - Origin-site session cookie, relayed as-is
    pub async fn start(
        &self,
        start_page: u32,
        end_page: u32,
        skip_existing: bool,
        credential: &str,
    ) -> Result<CrawlProgress> {
        if start_page < 1 || end_page < start_page {
            return Err(Error::Crawl(CrawlError::InvalidPageRange {
                start_page,
                end_page,
                reason: "end page must not precede start page".to_string(),
            }));
        }

        let total_pages = end_page - start_page + 1;
        let max_pages = self.config.crawl.max_pages_per_task;
        if total_pages > max_pages {
            return Err(Error::Crawl(CrawlError::InvalidPageRange {
                start_page,
                end_page,
                reason: format!("a single task covers at most {} pages", max_pages),
            }));
        }

        let session_name = format!("爬取 {}-{} 页", start_page, end_page);
        let session_id = self.db.create_session(&session_name, total_pages).await?;
        self.registry.set(session_id, RunState::running());

        tracing::info!(
            session_id = session_id.0,
            start_page = start_page,
            end_page = end_page,
            skip_existing = skip_existing,
            "Crawl session started"
        );
        self.emit_event(Event::SessionStarted {
            id: session_id,
            name: session_name,
            total_pages,
        });

        // Fire-and-forget: the task reports through the session row
        let ctx = CrawlTaskContext {
            session_id,
            credential: credential.to_string(),
            crawler: self.clone(),
        };
        tokio::spawn(task::run_crawl_task(
            ctx,
            Some(CrawlRange {
                start_page,
                end_page,
                skip_existing,
            }),
        ));

        Ok(CrawlProgress {
            session_id,
            status: Status::Running,
            phase: Phase::List,
            current_page: 0,
            total_pages,
            total_news: 0,
            pending_news: 0,
            crawled_news: 0,
            failed_news: 0,
            avg_speed: 0.0,
            estimated_minutes: 0,
            started_at: Utc::now(),
            finished_at: None,
        })
    }

    /// Pause a running crawl session
    ///
    /// Cooperative: the running task notices the registry change at its next
    /// cancellation point. In-flight detail fetches finish (or fail) first;
    /// their articles stay accounted for. Pausing a session that is not
    /// running fails with [`CrawlError::InvalidState`] — including a second
    /// pause in a row.
    pub async fn pause(&self, id: SessionId) -> Result<()> {
        if !self.registry.transition(id, Status::Running, Status::Paused) {
            let current_state = self
                .registry
                .get(id)
                .map(|state| format!("{:?}", state.status).to_lowercase())
                .unwrap_or_else(|| "not registered".to_string());
            return Err(Error::Crawl(CrawlError::InvalidState {
                id: id.0,
                operation: "pause".to_string(),
                current_state,
            }));
        }

        self.db
            .update_session(
                id,
                &crate::db::SessionUpdate {
                    status: Some(Status::Paused.to_i32()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(session_id = id.0, "Crawl session paused");
        self.emit_event(Event::SessionPaused { id });

        Ok(())
    }

    /// Resume a paused crawl session
    ///
    /// Continues the detail phase only, anchored at the stored pending set:
    /// the list phase's inserts are already durable and re-scanning listing
    /// pages would be wasted work. The caller must re-validate the
    /// credential before invoking.
    pub async fn resume(&self, id: SessionId, credential: &str) -> Result<()> {
        let session = self
            .db
            .get_session(id)
            .await?
            .ok_or(Error::Crawl(CrawlError::SessionNotFound { id: id.0 }))?;

        let current_status = Status::from_i32(session.status);
        if current_status != Status::Paused {
            return Err(Error::Crawl(CrawlError::InvalidState {
                id: id.0,
                operation: "resume".to_string(),
                current_state: format!("{:?}", current_status).to_lowercase(),
            }));
        }

        // The registry entry may be gone after a restart; (re)register fresh.
        // Speed accounting starts from a new basis — prior timers are lost
        // with the process, by design.
        self.registry.set(id, RunState::running());
        self.db
            .update_session(
                id,
                &crate::db::SessionUpdate {
                    status: Some(Status::Running.to_i32()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(session_id = id.0, "Crawl session resumed");
        self.emit_event(Event::SessionResumed { id });

        let ctx = CrawlTaskContext {
            session_id: id,
            credential: credential.to_string(),
            crawler: self.clone(),
        };
        tokio::spawn(task::run_crawl_task(ctx, None));

        Ok(())
    }

    /// Point-in-time progress snapshot for a session
    ///
    /// Returns `None` for an unknown session; never blocks on the crawl.
    pub async fn status(&self, id: SessionId) -> Result<Option<CrawlProgress>> {
        Ok(self.db.get_session(id).await?.map(snapshot_from_row))
    }

    /// Reset every failed article back to pending for a fresh attempt
    ///
    /// Global, not session-scoped. Returns the number of articles reset; a
    /// subsequent start or resume picks them up with the next pending batch.
    pub async fn retry_failed(&self) -> Result<u64> {
        let count = self.db.retry_all_failed().await?;
        tracing::info!(count = count, "Reset failed articles to pending");
        Ok(count)
    }

    /// Global article counts by status
    pub async fn stats(&self) -> Result<NewsStats> {
        self.db.news_stats().await
    }

    /// Recent sessions as progress snapshots, most recently started first
    pub async fn sessions(&self, limit: u32) -> Result<Vec<CrawlProgress>> {
        let rows = self.db.list_sessions(limit).await?;
        Ok(rows.into_iter().map(snapshot_from_row).collect())
    }

    /// Pause every running session (graceful shutdown)
    ///
    /// Paused sessions are resumable later; nothing is lost beyond the
    /// in-process timers.
    pub async fn shutdown(&self) -> Result<()> {
        let running = self.registry.running_ids();
        let mut paused_count = 0;

        for id in running {
            match self.pause(id).await {
                Ok(()) => paused_count += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = id.0,
                        error = %e,
                        "Failed to pause session during shutdown"
                    );
                }
            }
        }

        tracing::info!(paused_count = paused_count, "Crawler shut down");
        Ok(())
    }
}

/// Build a progress snapshot from a persisted session row
fn snapshot_from_row(row: CrawlSessionRow) -> CrawlProgress {
    let status = Status::from_i32(row.status);
    let phase = Phase::from_i32(row.phase);

    let estimated_minutes = if phase == Phase::Detail {
        progress::estimated_minutes_remaining(row.pending_news.max(0) as u64, row.avg_speed)
    } else {
        0
    };

    CrawlProgress {
        session_id: SessionId(row.id),
        status,
        phase,
        current_page: row.current_page.max(0) as u32,
        total_pages: row.total_pages.max(0) as u32,
        total_news: row.total_news.max(0) as u64,
        pending_news: row.pending_news.max(0) as u64,
        crawled_news: row.crawled_news.max(0) as u64,
        failed_news: row.failed_news.max(0) as u64,
        avg_speed: row.avg_speed,
        estimated_minutes,
        started_at: Utc
            .timestamp_opt(row.started_at, 0)
            .single()
            .unwrap_or_else(Utc::now),
        finished_at: row
            .finished_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
    }
}
