//! Shared fixtures for crawler tests — a scriptable mock site client and a
//! crawler wired to a temp database with near-zero pacing delays.

use crate::config::{Config, CrawlConfig, PersistenceConfig};
use crate::error::Error;
use crate::site::{ListFetch, SiteClient};
use crate::types::{ArticleDetail, ArticleStub, ListPage};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

use super::NewsCrawler;

/// Scriptable [`SiteClient`] for orchestrator tests
///
/// Listing pages are keyed by page number; unknown pages come back empty.
/// Detail fetches succeed with synthesized content unless the source_id is
/// scripted to fail. Counters observe fetch traffic and pool concurrency.
#[derive(Default)]
pub(crate) struct MockSiteClient {
    list_pages: HashMap<u32, ListFetch>,
    failing_details: HashSet<String>,
    detail_delay: Duration,
    /// Listing pages fetched
    pub list_fetches: AtomicUsize,
    /// Detail pages fetched (attempts, including failures)
    pub detail_fetches: AtomicUsize,
    /// Detail fetches currently in flight
    in_flight: AtomicUsize,
    /// High-water mark of concurrent detail fetches
    pub max_in_flight: AtomicUsize,
}

impl MockSiteClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve these stubs for the given page number
    pub(crate) fn with_list_page(mut self, page: u32, articles: Vec<ArticleStub>) -> Self {
        self.list_pages.insert(
            page,
            ListFetch::Page(ListPage {
                page,
                total_count: articles.len() as u64,
                articles,
            }),
        );
        self
    }

    /// Serve the auth wall for the given page number
    pub(crate) fn with_auth_wall(mut self, page: u32) -> Self {
        self.list_pages.insert(page, ListFetch::AuthRequired);
        self
    }

    /// Make detail fetches for this source_id fail
    pub(crate) fn with_failing_detail(mut self, source_id: &str) -> Self {
        self.failing_details.insert(source_id.to_string());
        self
    }

    /// Hold each detail fetch open for this long (to observe concurrency)
    pub(crate) fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl SiteClient for MockSiteClient {
    async fn fetch_list_page(&self, page: u32, _credential: &str) -> crate::Result<ListFetch> {
        self.list_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.list_pages.get(&page).cloned().unwrap_or_else(|| {
            ListFetch::Page(ListPage {
                page,
                total_count: 0,
                articles: vec![],
            })
        }))
    }

    async fn fetch_article_detail(
        &self,
        source_id: &str,
        _url: &str,
    ) -> crate::Result<ArticleDetail> {
        self.detail_fetches.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.detail_delay.is_zero() {
            tokio::time::sleep(self.detail_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_details.contains(source_id) {
            return Err(Error::Site(format!("fetch of {} blew up", source_id)));
        }

        Ok(ArticleDetail {
            source_id: source_id.to_string(),
            title: format!("Article {}", source_id),
            content_html: format!("<p>Body of {}</p>", source_id),
            content_text: format!("Body of {}", source_id),
            author: "测试".to_string(),
            source_name: "安徽财经网".to_string(),
            category: "经济".to_string(),
            region: "黄山".to_string(),
            publish_time: None,
        })
    }
}

/// A publishable (valid-status) article stub
pub(crate) fn valid_stub(source_id: &str) -> ArticleStub {
    ArticleStub {
        source_id: source_id.to_string(),
        source_url: format!("https://news.example.com/show-{}.html", source_id),
        title: format!("Article {}", source_id),
        category: "经济".to_string(),
        publish_time: None,
        site_status: "通过".to_string(),
    }
}

/// A stub the site has not approved; the list phase must discard it
pub(crate) fn unapproved_stub(source_id: &str) -> ArticleStub {
    ArticleStub {
        site_status: "待审核".to_string(),
        ..valid_stub(source_id)
    }
}

/// Build a crawler around the given mock with near-zero pacing delays
///
/// Returns a typed handle to the mock so tests can read its counters after
/// it goes behind the trait object.
pub(crate) async fn setup_crawler(
    site: MockSiteClient,
) -> (NewsCrawler, Arc<MockSiteClient>, NamedTempFile) {
    setup_crawler_with(site, |_| {}).await
}

/// Build a crawler, letting the caller tweak the crawl config first
pub(crate) async fn setup_crawler_with(
    site: MockSiteClient,
    adjust: impl FnOnce(&mut CrawlConfig),
) -> (NewsCrawler, Arc<MockSiteClient>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let mut crawl = CrawlConfig {
        list_page_delay_ms: 1,
        detail_page_delay_ms: 1,
        article_delay_ms: 0,
        ..Default::default()
    };
    adjust(&mut crawl);

    let config = Config {
        crawl,
        persistence: PersistenceConfig {
            database_path: temp_file.path().to_path_buf(),
        },
        ..Default::default()
    };

    let site = Arc::new(site);
    let crawler = NewsCrawler::with_site_client(config, site.clone())
        .await
        .unwrap();
    (crawler, site, temp_file)
}

/// Poll a session's progress until the predicate holds, or panic after ~5 seconds
pub(crate) async fn wait_for(
    crawler: &NewsCrawler,
    id: crate::types::SessionId,
    what: &str,
    predicate: impl Fn(&crate::types::CrawlProgress) -> bool,
) {
    for _ in 0..200 {
        if let Some(progress) = crawler.status(id).await.unwrap() {
            if predicate(&progress) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("timed out waiting for: {}", what);
}
