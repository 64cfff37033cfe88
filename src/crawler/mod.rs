//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier: visited set and work queue shared by all workers
//! - HTTP fetching with rotating user agents and a single forced retry
//! - Link extraction and scope classification for navigation pages
//! - Article extraction from structured data and fallback selectors
//! - Overall crawl coordination

mod article;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod user_agent;

pub use article::{ArticleExtractor, ArticleRecord};
pub use coordinator::{Coordinator, CrawlReport, RunOutcome};
pub use fetcher::{
    build_http_client, is_html, FetchResult, FetchedPage, Fetcher, Rejection, RequestContext,
    MAX_RETRIES,
};
pub use frontier::{CrawlTask, Frontier, FrontierLease, TaskKind};
pub use parser::{extract_links, on_navigation_page, select_attribute, select_text, LinkTasks};
pub use user_agent::{FixedUserAgent, RotatingUserAgents, UserAgentSource, FALLBACK_USER_AGENT};

pub(crate) use article::is_valid_date_format;

use crate::config::Config;
use crate::output::ArticleSink;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the scope filter, extractor and
///    HTTP client
/// 2. Check that the seed host resolves
/// 3. Crawl from the seed until the frontier drains
/// 4. Flush the sink
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Destination for extracted articles
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished
/// * `Err(HarvestError)` - Crawl could not start or the sink failed to flush
///
/// # Example
///
/// ```no_run
/// use article_harvest::config::load_config;
/// use article_harvest::crawler::crawl;
/// use article_harvest::output::JsonLinesSink;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let sink = Arc::new(JsonLinesSink::open(Path::new(&config.output.path))?);
/// let report = crawl(config, sink).await?;
/// println!("{} articles", report.statistics.articles());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, sink: Arc<dyn ArticleSink>) -> crate::Result<CrawlReport> {
    Coordinator::new(config, sink)?.run().await
}
