//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client from the crawler settings
//! - Browser-like request headers with a rotating user agent
//! - Cache-busting headers on forced retries
//! - Classifying responses into success, terminal rejection or retryable failure

use crate::config::CrawlerConfig;
use crate::crawler::user_agent::{UserAgentSource, FALLBACK_USER_AGENT};
use crate::state::PageOutcome;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, PRAGMA, REFERER,
    USER_AGENT,
};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Accept header sent with every request
pub const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Accept-Language header sent with every request
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// A failed request is re-issued at most this many times
pub const MAX_RETRIES: u8 = 1;

/// Everything needed to issue one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// URL to fetch
    pub url: Url,

    /// Page the link was found on; `None` for the seed
    pub referer: Option<Url>,

    /// Bypass caches (set on retries)
    pub force: bool,

    /// Number of times this request has already been retried
    pub attempt: u8,
}

impl RequestContext {
    /// Request for the seed page
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            referer: None,
            force: false,
            attempt: 0,
        }
    }

    /// Request for a link discovered on `parent`
    pub fn child(url: Url, parent: &Url) -> Self {
        Self {
            url,
            referer: Some(parent.clone()),
            force: false,
            attempt: 0,
        }
    }

    /// The forced re-issue of this request, or `None` once retries are spent
    pub fn retry(&self) -> Option<Self> {
        (self.attempt < MAX_RETRIES).then(|| Self {
            url: self.url.clone(),
            referer: self.referer.clone(),
            force: true,
            attempt: self.attempt + 1,
        })
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: String,
}

/// Why a response was discarded without retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Status outside 2xx
    NonSuccessStatus { status: u16 },
    /// Body is not HTML
    ContentMismatch { content_type: String },
}

impl Rejection {
    pub fn outcome(&self) -> PageOutcome {
        match self {
            Self::NonSuccessStatus { .. } => PageOutcome::NonSuccessStatus,
            Self::ContentMismatch { .. } => PageOutcome::ContentMismatch,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonSuccessStatus { status } => write!(f, "HTTP {}", status),
            Self::ContentMismatch { content_type } if content_type.is_empty() => {
                write!(f, "missing Content-Type")
            }
            Self::ContentMismatch { content_type } => write!(f, "expected HTML, got {}", content_type),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// 2xx HTML response
    Success(FetchedPage),

    /// Transport error (DNS, connect, timeout, body read); may be retried
    Failure {
        reason: String,
        request: RequestContext,
    },

    /// Response received but not usable; never retried
    Rejected(Rejection),
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is not set on the client; each request carries its own.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for `text/html` and `application/xhtml+xml`, parameters ignored
pub fn is_html(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    media_type == "text/html" || media_type == "application/xhtml+xml"
}

/// Issues requests on behalf of the workers
pub struct Fetcher {
    client: Client,
    user_agents: Arc<dyn UserAgentSource>,
    site_root: Url,
}

impl Fetcher {
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `user_agents` - Source of per-request user agents
    /// * `site_root` - Referer used for the seed request
    pub fn new(client: Client, user_agents: Arc<dyn UserAgentSource>, site_root: Url) -> Self {
        Self {
            client,
            user_agents,
            site_root,
        }
    }

    /// Builds the headers for one request
    pub fn headers_for(&self, request: &RequestContext) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let user_agent = self.user_agents.next_user_agent();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let referer = request.referer.as_ref().unwrap_or(&self.site_root);
        if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
            headers.insert(REFERER, value);
        }

        if request.force {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        headers
    }

    /// Fetches a page
    ///
    /// # Response Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with HTML Content-Type | `Success` |
    /// | Status outside 2xx | `Rejected` |
    /// | Non-HTML or missing Content-Type | `Rejected` |
    /// | Timeout, connection or body error | `Failure` |
    ///
    /// Redirects are followed by the client; `final_url` is where they ended.
    pub async fn fetch(&self, request: &RequestContext) -> FetchResult {
        let response = match self
            .client
            .get(request.url.clone())
            .headers(self.headers_for(request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return FetchResult::Failure {
                    reason: describe_error(&e),
                    request: request.clone(),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::Rejected(Rejection::NonSuccessStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return FetchResult::Rejected(Rejection::ContentMismatch { content_type });
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        match response.text().await {
            Ok(body) => FetchResult::Success(FetchedPage {
                final_url,
                status: status.as_u16(),
                content_type,
                headers,
                body,
            }),
            Err(e) => FetchResult::Failure {
                reason: format!("Failed to read body: {}", describe_error(&e)),
                request: request.clone(),
            },
        }
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_redirect() {
        format!("Redirect error: {}", error)
    } else {
        error.to_string()
    }
}
