//! Crawl orchestration engine, organized by concern:
//! - [`registry`] - In-memory task-state registry (cooperative cancellation)
//! - [`control`] - Session lifecycle operations (start/pause/resume/status/retry)
//! - [`task`] - The detached two-phase crawl task
//! - [`pool`] - Bounded-concurrency detail pool
//! - [`progress`] - Speed and ETA math

mod control;
mod pool;
mod progress;
pub mod registry;
mod task;

pub use pool::DetailOutcome;
pub use registry::{RunState, TaskRegistry};

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::site::{HttpSiteClient, SiteClient};
use std::sync::Arc;

/// Main crawler instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct NewsCrawler {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query article and session state
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<crate::types::Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Origin-site client (trait object for pluggable transports)
    pub(crate) site: Arc<dyn SiteClient>,
    /// In-memory run state for live sessions; lost on restart, by design
    pub(crate) registry: Arc<TaskRegistry>,
}

impl NewsCrawler {
    /// Create a new NewsCrawler instance
    ///
    /// This initializes all core components:
    /// - Validates the configuration
    /// - Opens/creates the SQLite database and runs migrations
    /// - Builds the HTTP client for the configured origin site
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config) -> Result<Self> {
        let site = Arc::new(HttpSiteClient::new(config.site.clone())?);
        Self::with_site_client(config, site).await
    }

    /// Create a NewsCrawler with a custom [`SiteClient`] implementation
    ///
    /// Useful for tests and for embedding behind a different transport
    /// (a proxy, a fixture server, a recorded corpus).
    pub async fn with_site_client(config: Config, site: Arc<dyn SiteClient>) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;

        // Buffer of 1000 events; slow subscribers see RecvError::Lagged
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            site,
            registry: Arc::new(TaskRegistry::new()),
        })
    }

    /// Subscribe to crawl events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently. Events are buffered, but if a subscriber falls
    /// behind by more than 1000 events, it will receive a
    /// `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::types::Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped
    /// (ok() converts Err to None). The crawl continues whether or not
    /// anyone is listening.
    pub(crate) fn emit_event(&self, event: crate::types::Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with crawl processing and listens on
    /// the configured bind address (default: 127.0.0.1:6788).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let crawler = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(crawler, config).await })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
