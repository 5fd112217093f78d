//! Origin-site access — the fetch/parse boundary the crawl engine calls.
//!
//! The engine only ever talks to [`SiteClient`]; the reqwest-backed
//! [`HttpSiteClient`] is the production implementation, and tests substitute
//! their own.

use crate::Result;
use crate::types::{ArticleDetail, ListPage};

mod http;
mod parse;

pub use http::HttpSiteClient;
pub use parse::{extract_author, html_to_text, parse_publish_time};

/// Outcome of a listing-page fetch
#[derive(Clone, Debug, PartialEq)]
pub enum ListFetch {
    /// The page was fetched and parsed
    Page(ListPage),
    /// The origin site answered with its auth wall instead of the listing
    ///
    /// Fatal for the crawl session; the credential must be refreshed
    /// out-of-band.
    AuthRequired,
}

/// Abstraction over origin-site fetching, enabling testability.
#[async_trait::async_trait]
pub trait SiteClient: Send + Sync {
    /// Fetch and parse one listing page
    ///
    /// `credential` is the origin-site session cookie relayed by the caller.
    async fn fetch_list_page(&self, page: u32, credential: &str) -> Result<ListFetch>;

    /// Fetch and parse one article detail page
    async fn fetch_article_detail(&self, source_id: &str, url: &str) -> Result<ArticleDetail>;
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
