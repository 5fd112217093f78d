//! Concurrent detail pool — bounded fan-out over a batch of pending articles.

use crate::db::{Database, PendingArticle};
use crate::site::SiteClient;
use crate::types::{Event, SessionId};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::time::Duration;

use super::registry::TaskRegistry;

/// Per-article outcome from a pool run
///
/// Every input article yields exactly one outcome. Skipped articles were
/// never attempted (the session stopped running first); they stay pending in
/// storage and are picked up by the next batch or a resumed session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailOutcome {
    /// Detail fetched and persisted
    Crawled {
        /// The article's natural key
        source_id: String,
    },
    /// Fetch or parse failed; the article row was marked failed
    Failed {
        /// The article's natural key
        source_id: String,
        /// The error recorded on the row
        error: String,
    },
    /// Skipped without an attempt because the session is no longer running
    Skipped {
        /// The article's natural key
        source_id: String,
    },
}

/// Parameters for one pool run over a batch
pub(super) struct DetailPoolParams<'a> {
    /// Session the batch belongs to
    pub session_id: SessionId,
    /// Pending articles to process
    pub articles: Vec<PendingArticle>,
    /// Maximum simultaneous fetches
    pub concurrency: usize,
    /// Delay applied after every item before its slot is freed
    pub article_delay: Duration,
    /// Database handle for persisting outcomes
    pub db: &'a Database,
    /// Origin-site client
    pub site: &'a dyn SiteClient,
    /// Registry consulted per item for cooperative cancellation
    pub registry: &'a TaskRegistry,
    /// Event channel for per-article notifications
    pub events: &'a tokio::sync::broadcast::Sender<Event>,
}

/// Process a batch of pending articles with at most `concurrency` in flight
///
/// Returns one outcome per input article, order-independent: callers
/// aggregate by counting, not by position.
pub(super) async fn crawl_details_concurrently(
    params: DetailPoolParams<'_>,
) -> Vec<DetailOutcome> {
    let DetailPoolParams {
        session_id,
        articles,
        concurrency,
        article_delay,
        db,
        site,
        registry,
        events,
    } = params;

    let total = articles.len();
    let mut queue: VecDeque<PendingArticle> = articles.into();
    let mut in_flight = FuturesUnordered::new();
    let mut outcomes = Vec::with_capacity(total);

    loop {
        // Fill free slots from the queue
        while in_flight.len() < concurrency {
            let Some(article) = queue.pop_front() else {
                break;
            };
            in_flight.push(process_article(
                session_id,
                article,
                article_delay,
                db,
                site,
                registry,
                events,
            ));
        }

        // Await the completion of at least one in-flight item; None means
        // both the queue and the in-flight set are drained
        match in_flight.next().await {
            Some(outcome) => outcomes.push(outcome),
            None => break,
        }
    }

    outcomes
}

/// Process a single pending article inside the pool
async fn process_article(
    session_id: SessionId,
    article: PendingArticle,
    article_delay: Duration,
    db: &Database,
    site: &dyn SiteClient,
    registry: &TaskRegistry,
    events: &tokio::sync::broadcast::Sender<Event>,
) -> DetailOutcome {
    let outcome = if !registry.is_running(session_id) {
        // Cooperative cancellation at per-item granularity: the article
        // stays pending in storage, untouched
        DetailOutcome::Skipped {
            source_id: article.source_id,
        }
    } else {
        crawl_one(session_id, &article, db, site, events).await
    };

    // Inter-item delay before the slot is freed, smoothing burst load on
    // the origin site
    tokio::time::sleep(article_delay).await;

    outcome
}

/// Fetch, parse, and persist one article detail
async fn crawl_one(
    session_id: SessionId,
    article: &PendingArticle,
    db: &Database,
    site: &dyn SiteClient,
    events: &tokio::sync::broadcast::Sender<Event>,
) -> DetailOutcome {
    tracing::debug!(
        session_id = session_id.0,
        source_id = %article.source_id,
        "Crawling article detail"
    );

    let result = async {
        let detail = site
            .fetch_article_detail(&article.source_id, &article.source_url)
            .await?;
        db.update_article_detail(&detail).await
    }
    .await;

    match result {
        Ok(()) => {
            events
                .send(Event::ArticleCrawled {
                    id: session_id,
                    source_id: article.source_id.clone(),
                })
                .ok();
            DetailOutcome::Crawled {
                source_id: article.source_id.clone(),
            }
        }
        Err(e) => {
            let error = e.to_string();
            tracing::warn!(
                session_id = session_id.0,
                source_id = %article.source_id,
                error = %error,
                "Article detail crawl failed"
            );

            if let Err(mark_err) = db.mark_article_failed(&article.source_id, &error).await {
                tracing::error!(
                    session_id = session_id.0,
                    source_id = %article.source_id,
                    error = %mark_err,
                    "Failed to record article failure"
                );
            }

            events
                .send(Event::ArticleFailed {
                    id: session_id,
                    source_id: article.source_id.clone(),
                    error: error.clone(),
                })
                .ok();

            DetailOutcome::Failed {
                source_id: article.source_id.clone(),
                error,
            }
        }
    }
}
