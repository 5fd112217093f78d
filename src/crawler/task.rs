//! The detached crawl task — list-phase walk and detail-phase batch loop.
//!
//! One task runs per active session, fire-and-forget: errors are funneled
//! into the persisted session row and the registry, never to a caller.

use crate::Result;
use crate::db::SessionUpdate;
use crate::error::{CrawlError, Error};
use crate::site::ListFetch;
use crate::types::{Event, Phase, SessionId, Status};
use std::time::Instant;

use super::NewsCrawler;
use super::pool::{self, DetailOutcome, DetailPoolParams};
use super::progress;

/// Page range for a full two-phase run
#[derive(Clone, Copy, Debug)]
pub(super) struct CrawlRange {
    /// First listing page (1-based, inclusive)
    pub start_page: u32,
    /// Last listing page (inclusive)
    pub end_page: u32,
    /// Drop stubs whose natural key already has a row
    pub skip_existing: bool,
}

/// Context for one detached crawl task
pub(super) struct CrawlTaskContext {
    /// Session this task drives
    pub session_id: SessionId,
    /// Origin-site session cookie
    pub credential: String,
    /// Shared crawler handle (db, config, site client, registry, events)
    pub crawler: NewsCrawler,
}

/// How a phase loop ended
enum PhaseExit {
    /// The phase ran to its natural end
    Finished,
    /// The registry stopped the task (pause); leave state as-is and return
    Interrupted,
}

/// Run a crawl task to completion, funneling any error into session state
///
/// `range` is `Some` for a fresh start (both phases) and `None` for a
/// resumed session (detail phase only, anchored at the stored pending set).
pub(super) async fn run_crawl_task(ctx: CrawlTaskContext, range: Option<CrawlRange>) {
    let session_id = ctx.session_id;

    if let Err(e) = execute(&ctx, range).await {
        let error = e.to_string();
        tracing::error!(
            session_id = session_id.0,
            error = %error,
            "Crawl task failed"
        );

        // The caller of start() has long returned; failure is only
        // observable through the session row and the registry
        if let Err(db_err) = ctx
            .crawler
            .db
            .update_session(
                session_id,
                &SessionUpdate {
                    status: Some(Status::Failed.to_i32()),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::error!(
                session_id = session_id.0,
                error = %db_err,
                "Failed to persist failed session status"
            );
        }
        ctx.crawler.registry.set_status(session_id, Status::Failed);
        ctx.crawler
            .emit_event(Event::SessionFailed { id: session_id, error });
    }
}

/// Execute the task body; an early Ok return means the task was paused
async fn execute(ctx: &CrawlTaskContext, range: Option<CrawlRange>) -> Result<()> {
    if let Some(range) = range {
        match run_list_phase(ctx, range).await? {
            PhaseExit::Finished => {}
            PhaseExit::Interrupted => return Ok(()),
        }
    }

    run_detail_phase(ctx).await
}

/// Walk the listing pages in ascending order, inserting discovered stubs
async fn run_list_phase(ctx: &CrawlTaskContext, range: CrawlRange) -> Result<PhaseExit> {
    let session_id = ctx.session_id;
    let db = &ctx.crawler.db;
    let config = &ctx.crawler.config;

    tracing::info!(
        session_id = session_id.0,
        start_page = range.start_page,
        end_page = range.end_page,
        "Starting list phase"
    );

    let mut total_news = 0u64;

    for page in range.start_page..=range.end_page {
        // The only cancellation point in the list phase: between pages
        if !ctx.crawler.registry.is_running(session_id) {
            tracing::info!(session_id = session_id.0, "List phase stopped by registry");
            return Ok(PhaseExit::Interrupted);
        }

        let fetched = ctx
            .crawler
            .site
            .fetch_list_page(page, &ctx.credential)
            .await?;

        let list_page = match fetched {
            // Fatal: the credential must be refreshed out-of-band
            ListFetch::AuthRequired => {
                return Err(Error::Crawl(CrawlError::AuthRequired { page }));
            }
            ListFetch::Page(list_page) => list_page,
        };

        // Keep only stubs the site marks as publishable; everything else is
        // discarded permanently
        let mut stubs: Vec<_> = list_page
            .articles
            .into_iter()
            .filter(|stub| stub.site_status == config.site.valid_article_status)
            .collect();

        if range.skip_existing && !stubs.is_empty() {
            let ids: Vec<String> = stubs.iter().map(|s| s.source_id.clone()).collect();
            let existing = db.existing_ids(&ids).await?;
            stubs.retain(|stub| !existing.contains(&stub.source_id));
        }

        let inserted = if stubs.is_empty() {
            0
        } else {
            db.insert_stubs(&stubs).await?
        };
        total_news += inserted;

        tracing::info!(
            session_id = session_id.0,
            page = page,
            inserted = inserted,
            total_news = total_news,
            "Listing page processed"
        );
        ctx.crawler.emit_event(Event::ListPageCrawled {
            id: session_id,
            page,
            inserted,
        });

        // current_page is relative to this task's range: multiple tasks over
        // different ranges share one counter space
        db.update_session(
            session_id,
            &SessionUpdate {
                current_page: Some((page - range.start_page + 1) as i64),
                total_news: Some(total_news as i64),
                pending_news: Some(total_news as i64),
                ..Default::default()
            },
        )
        .await?;

        tokio::time::sleep(config.crawl.list_page_delay()).await;
    }

    Ok(PhaseExit::Finished)
}

/// Drain the pending set in batches through the concurrent detail pool
async fn run_detail_phase(ctx: &CrawlTaskContext) -> Result<()> {
    let session_id = ctx.session_id;
    let db = &ctx.crawler.db;
    let config = &ctx.crawler.config;

    // The pending count comes from storage, not from list-phase arithmetic:
    // earlier sessions may have left pending articles behind
    let pending_count = db.count_pending().await?;

    tracing::info!(
        session_id = session_id.0,
        pending = pending_count,
        concurrency = config.crawl.concurrency,
        "Starting detail phase"
    );

    db.update_session(
        session_id,
        &SessionUpdate {
            phase: Some(Phase::Detail.to_i32()),
            pending_news: Some(pending_count as i64),
            ..Default::default()
        },
    )
    .await?;

    let detail_started = Instant::now();
    ctx.crawler
        .registry
        .mark_detail_started(session_id, detail_started);

    let mut crawled = 0u64;
    let mut failed = 0u64;
    let mut batch_count = 0u32;
    let mut drained = false;

    while ctx.crawler.registry.is_running(session_id) {
        let batch = db.get_pending_articles(config.crawl.batch_size).await?;
        if batch.is_empty() {
            // Natural phase completion: nothing left to do
            drained = true;
            break;
        }

        tracing::info!(
            session_id = session_id.0,
            batch = batch_count + 1,
            batch_size = batch.len(),
            "Processing detail batch"
        );

        let outcomes = pool::crawl_details_concurrently(DetailPoolParams {
            session_id,
            articles: batch,
            concurrency: config.crawl.concurrency,
            article_delay: config.crawl.article_delay(),
            db: db.as_ref(),
            site: ctx.crawler.site.as_ref(),
            registry: ctx.crawler.registry.as_ref(),
            events: &ctx.crawler.event_tx,
        })
        .await;

        // Aggregate only after the whole batch is done; skipped items count
        // as neither success nor failure
        for outcome in &outcomes {
            match outcome {
                DetailOutcome::Crawled { .. } => crawled += 1,
                DetailOutcome::Failed { .. } => failed += 1,
                DetailOutcome::Skipped { .. } => {}
            }
        }
        ctx.crawler.registry.set_crawled(session_id, crawled);

        let avg_speed = progress::speed(crawled, detail_started);
        // Re-query rather than subtract: storage stays the source of truth
        let remaining = db.count_pending().await?;

        db.update_session(
            session_id,
            &SessionUpdate {
                crawled_news: Some(crawled as i64),
                failed_news: Some(failed as i64),
                pending_news: Some(remaining as i64),
                avg_speed: Some(avg_speed),
                ..Default::default()
            },
        )
        .await?;

        batch_count += 1;
        tracing::info!(
            session_id = session_id.0,
            batch = batch_count,
            crawled = crawled,
            failed = failed,
            avg_speed = avg_speed,
            "Detail batch completed"
        );
        ctx.crawler.emit_event(Event::BatchCompleted {
            id: session_id,
            crawled,
            failed,
            avg_speed,
        });

        if ctx.crawler.registry.is_running(session_id) {
            tokio::time::sleep(config.crawl.detail_page_delay()).await;
        }
    }

    // Only the empty-batch exit is completion; a pause exit leaves the
    // paused state in place for a later resume
    if drained {
        db.update_session(
            session_id,
            &SessionUpdate {
                status: Some(Status::Completed.to_i32()),
                phase: Some(Phase::Completed.to_i32()),
                pending_news: Some(0),
                ..Default::default()
            },
        )
        .await?;
        ctx.crawler
            .registry
            .set_status(session_id, Status::Completed);

        tracing::info!(
            session_id = session_id.0,
            crawled = crawled,
            failed = failed,
            "Crawl session completed"
        );
        ctx.crawler.emit_event(Event::SessionCompleted {
            id: session_id,
            crawled,
            failed,
        });
    } else {
        tracing::info!(
            session_id = session_id.0,
            crawled = crawled,
            failed = failed,
            "Detail phase stopped by registry"
        );
    }

    Ok(())
}
