use serde::Deserialize;

/// Default number of frontier entries processed per run
pub const DEFAULT_BATCH_LIMIT: u32 = 5;

/// Default politeness delay between article fetches (milliseconds)
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("article-archiver/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure for the archiver
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Target read from the file. When absent, the target must be resolved
    /// from the store by domain.
    #[serde(default)]
    pub target: Option<CrawlTarget>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of frontier entries processed in one run
    #[serde(rename = "batch-limit", default = "default_batch_limit")]
    pub batch_limit: u32,

    /// Fixed delay after each article fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// User agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            user_agent: default_user_agent(),
        }
    }
}

fn default_batch_limit() -> u32 {
    DEFAULT_BATCH_LIMIT
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Selector configuration for one site
///
/// All selectors are plain CSS selector strings interpreted at run time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlTarget {
    /// Domain identifying the target (e.g., "news.example.com")
    pub domain: String,

    /// Listing page enumerating the articles
    pub url: String,

    /// Repeating container on the listing page
    pub block: String,

    /// Anchor inside each block carrying the article link
    pub article_link: String,

    /// Article title
    pub title: String,

    /// Article body
    pub body: String,

    /// Free-text update timestamp
    pub article_updated_at: String,

    /// Boilerplate removed before title and body are extracted
    pub remove_class: String,
}
