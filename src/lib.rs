//! # newscrawl
//!
//! Backend library for operating a resumable, pausable, two-phase crawl of a
//! news site: a list phase that discovers article stubs from paginated
//! listing pages, and a detail phase that fetches full articles with bounded
//! concurrency. Progress is persisted in SQLite after every page and batch,
//! so a paused or interrupted session picks back up from its stored pending
//! set.
//!
//! ## Design Philosophy
//!
//! newscrawl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Resumable** - Storage is the source of truth; sessions survive pauses
//! - **Polite** - Paced fetches, bounded concurrency, per-item delays
//! - **Observable** - Progress rows for polling, broadcast events for push
//!
//! ## Quick Start
//!
//! ```no_run
//! use newscrawl::{Config, NewsCrawler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let crawler = NewsCrawler::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = crawler.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Crawl listing pages 1-5, skipping already-known articles
//!     let progress = crawler.start(1, 5, true, "cookie-from-dashboard").await?;
//!     println!("Session {} started", progress.session_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Crawl orchestration engine
pub mod crawler;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Origin-site fetching and parsing
pub mod site;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, CrawlConfig, PersistenceConfig, SiteConfig};
pub use crawler::{DetailOutcome, NewsCrawler, TaskRegistry};
pub use db::Database;
pub use error::{ApiError, CrawlError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use site::{HttpSiteClient, ListFetch, SiteClient};
pub use types::{
    ArticleDetail, ArticleStub, CrawlProgress, Event, ListPage, NewsStats, Phase, SessionId,
    Status,
};

/// Helper function to run the crawler with graceful signal handling.
///
/// Waits for a termination signal and then calls the crawler's `shutdown()`
/// method, which pauses every running session so it can be resumed later.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use newscrawl::{Config, NewsCrawler, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let crawler = NewsCrawler::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(crawler).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(crawler: NewsCrawler) -> Result<()> {
    wait_for_signal().await;
    crawler.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
