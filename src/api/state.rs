//! Application state for the API server

use crate::{Config, NewsCrawler};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the crawler instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main NewsCrawler instance
    pub crawler: Arc<NewsCrawler>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(crawler: Arc<NewsCrawler>, config: Arc<Config>) -> Self {
        Self { crawler, config }
    }
}
