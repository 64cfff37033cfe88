use serde::Deserialize;

/// Main configuration structure for Article-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// The site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Target host; only URLs on exactly this host are in scope
    pub host: String,

    /// URL the crawl starts from
    pub seed: String,

    /// Hosts sharing the parent domain that are never crawled
    #[serde(rename = "secondary-hosts", default)]
    pub secondary_hosts: Vec<String>,
}

/// URL scope rules
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Literal text following the 12-digit article id at the end of the path
    #[serde(rename = "article-suffix", default = "default_article_suffix")]
    pub article_suffix: String,

    /// Path patterns excluded from the crawl
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Treat blacklist lint findings as fatal
    #[serde(rename = "strict-patterns", default)]
    pub strict_patterns: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            article_suffix: default_article_suffix(),
            blacklist: Vec::new(),
            strict_patterns: false,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of fetches in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: u32,

    /// Delay before each request (milliseconds)
    #[serde(rename = "request-delay-ms", default)]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrency(),
            request_delay_ms: 0,
            request_timeout_secs: default_timeout(),
        }
    }
}

/// User agent rotation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Pool of user agent strings; the built-in pool is used when omitted
    #[serde(default)]
    pub agents: Option<Vec<String>>,

    /// Used when the pool is empty
    #[serde(default = "default_fallback_agent")]
    pub fallback: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agents: None,
            fallback: default_fallback_agent(),
        }
    }
}

/// Selectors used when a page carries no structured data
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(rename = "heading-selector", default = "default_heading_selector")]
    pub heading_selector: String,

    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            heading_selector: default_heading_selector(),
            content_selector: default_content_selector(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// JSON Lines file articles are appended to
    pub path: String,

    /// strftime format for `updated_at`
    #[serde(rename = "date-format", default = "default_date_format")]
    pub date_format: String,
}

fn default_article_suffix() -> String {
    "_1.html".to_string()
}

fn default_concurrency() -> u32 {
    8
}

fn default_timeout() -> u64 {
    30
}

fn default_fallback_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_heading_selector() -> String {
    "h1".to_string()
}

fn default_content_selector() -> String {
    "div.p-content p".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}
