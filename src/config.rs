//! Configuration types for newscrawl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Crawl pacing and batching configuration
///
/// Groups the knobs that control how fast and how wide a crawl session runs.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CrawlConfig {
    /// Delay between listing-page fetches in milliseconds (default: 1000)
    #[serde(default = "default_list_page_delay_ms")]
    pub list_page_delay_ms: u64,

    /// Delay between detail batches in milliseconds (default: 500)
    #[serde(default = "default_detail_page_delay_ms")]
    pub detail_page_delay_ms: u64,

    /// Delay after each individual detail fetch in milliseconds (default: 200)
    ///
    /// Applied inside the concurrent pool before a slot is freed, smoothing
    /// burst load on the origin site.
    #[serde(default = "default_article_delay_ms")]
    pub article_delay_ms: u64,

    /// Maximum concurrent detail fetches within a batch (default: 5)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of pending articles pulled per detail batch (default: 20)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Maximum pages a single task may cover (default: 100)
    #[serde(default = "default_max_pages_per_task")]
    pub max_pages_per_task: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            list_page_delay_ms: default_list_page_delay_ms(),
            detail_page_delay_ms: default_detail_page_delay_ms(),
            article_delay_ms: default_article_delay_ms(),
            concurrency: default_concurrency(),
            batch_size: default_batch_size(),
            max_pages_per_task: default_max_pages_per_task(),
        }
    }
}

impl CrawlConfig {
    /// Delay between listing-page fetches
    pub fn list_page_delay(&self) -> Duration {
        Duration::from_millis(self.list_page_delay_ms)
    }

    /// Delay between detail batches
    pub fn detail_page_delay(&self) -> Duration {
        Duration::from_millis(self.detail_page_delay_ms)
    }

    /// Delay after each individual detail fetch
    pub fn article_delay(&self) -> Duration {
        Duration::from_millis(self.article_delay_ms)
    }
}

/// Origin-site configuration
///
/// Everything the site client needs to fetch and interpret the origin site's
/// listing and detail pages.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteConfig {
    /// Base URL of the origin site (default: "https://www.ahcaijing.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path + query of the member listing endpoint, relative to `base_url`
    ///
    /// The page number is appended as `&page=N`.
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Site-reported status an article must carry to be crawled
    ///
    /// Stubs with any other status are discarded permanently.
    #[serde(default = "default_valid_article_status")]
    pub valid_article_status: String,

    /// Region assigned when no keyword matches the title
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Region name → title keywords used to derive an article's region
    #[serde(default = "default_region_keywords")]
    pub region_keywords: HashMap<String, Vec<String>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            list_path: default_list_path(),
            user_agent: default_user_agent(),
            valid_article_status: default_valid_article_status(),
            default_region: default_region(),
            region_keywords: default_region_keywords(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./newscrawl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6788)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for NewsCrawler
///
/// Fields are organized into logical sub-configs:
/// - [`crawl`](CrawlConfig) — pacing, batching, concurrency, range limit
/// - [`site`](SiteConfig) — origin-site URLs, parsing constants
/// - [`persistence`](PersistenceConfig) — database path
/// - [`api`](ApiConfig) — embedded REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Crawl pacing and batching settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Origin-site settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning the first invalid setting found
    pub fn validate(&self) -> Result<()> {
        if self.crawl.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("crawl.concurrency".to_string()),
            });
        }
        if self.crawl.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be at least 1".to_string(),
                key: Some("crawl.batch_size".to_string()),
            });
        }
        if self.crawl.max_pages_per_task == 0 {
            return Err(Error::Config {
                message: "max_pages_per_task must be at least 1".to_string(),
                key: Some("crawl.max_pages_per_task".to_string()),
            });
        }
        if self.site.base_url.is_empty() {
            return Err(Error::Config {
                message: "base_url must not be empty".to_string(),
                key: Some("site.base_url".to_string()),
            });
        }
        Ok(())
    }
}

fn default_list_page_delay_ms() -> u64 {
    1000
}

fn default_detail_page_delay_ms() -> u64 {
    500
}

fn default_article_delay_ms() -> u64 {
    200
}

fn default_concurrency() -> usize {
    5
}

fn default_batch_size() -> u32 {
    20
}

fn default_max_pages_per_task() -> u32 {
    100
}

fn default_base_url() -> String {
    "https://www.ahcaijing.com".to_string()
}

fn default_list_path() -> String {
    "/index.php?m=member&c=content&a=published".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_valid_article_status() -> String {
    "通过".to_string()
}

fn default_region() -> String {
    "黄山".to_string()
}

fn default_region_keywords() -> HashMap<String, Vec<String>> {
    [
        ("屯溪区", vec!["屯溪"]),
        ("黟县", vec!["黟县"]),
        ("祁门县", vec!["祁门"]),
        ("歙县", vec!["歙县"]),
        ("休宁县", vec!["休宁"]),
        ("黄山区", vec!["黄山区"]),
        ("徽州区", vec!["徽州区"]),
    ]
    .into_iter()
    .map(|(region, keywords)| {
        (
            region.to_string(),
            keywords.into_iter().map(String::from).collect(),
        )
    })
    .collect()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./newscrawl.db")
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:6788".parse().unwrap_or_else(|_| {
        // Hardcoded literal is always parseable; fall back to an unspecified
        // port rather than panicking in a library.
        SocketAddr::from(([127, 0, 0, 1], 0))
    })
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
