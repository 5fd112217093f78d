//! Production [`SiteClient`] backed by reqwest.

use crate::config::SiteConfig;
use crate::error::Error;
use crate::types::ArticleDetail;
use crate::Result;
use reqwest::header::{COOKIE, USER_AGENT};
use std::time::Duration;

use super::{ListFetch, SiteClient, parse};

/// Request timeout for origin-site fetches
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production [`SiteClient`] that fetches the origin site over HTTPS
///
/// The origin site serves GBK-encoded pages; responses are decoded before
/// parsing.
pub struct HttpSiteClient {
    client: reqwest::Client,
    site: SiteConfig,
}

impl HttpSiteClient {
    /// Create a new client for the configured origin site
    pub fn new(site: SiteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, site })
    }

    /// Fetch a URL and decode the GBK response body
    async fn fetch_gbk(&self, url: &str, cookie: Option<&str>) -> Result<String> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.site.user_agent);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Site(format!("{} returned HTTP {}", url, status)));
        }

        let bytes = response.bytes().await?;
        let (decoded, _, _) = encoding_rs::GBK.decode(&bytes);
        Ok(decoded.into_owned())
    }
}

#[async_trait::async_trait]
impl SiteClient for HttpSiteClient {
    async fn fetch_list_page(&self, page: u32, credential: &str) -> Result<ListFetch> {
        let url = format!(
            "{}{}&page={}",
            self.site.base_url, self.site.list_path, page
        );

        let html = self.fetch_gbk(&url, Some(credential)).await?;

        if parse::is_login_required(&html)? {
            return Ok(ListFetch::AuthRequired);
        }

        let list_page = parse::parse_list_page(page, &html, &self.site.base_url)?;
        tracing::debug!(
            page = page,
            articles = list_page.articles.len(),
            total = list_page.total_count,
            "Fetched listing page"
        );

        Ok(ListFetch::Page(list_page))
    }

    async fn fetch_article_detail(&self, source_id: &str, url: &str) -> Result<ArticleDetail> {
        // The site redirects plain HTTP through an interstitial; go direct
        let secure_url = match url.strip_prefix("http://") {
            Some(rest) => format!("https://{}", rest),
            None => url.to_string(),
        };

        let html = self.fetch_gbk(&secure_url, None).await?;
        parse::parse_detail_page(source_id, &html, &self.site)
    }
}
