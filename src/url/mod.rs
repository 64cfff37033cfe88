//! URL handling module for Article-Harvest
//!
//! This module provides URL normalization, host checks, blacklist patterns
//! and the scope filter that decides what the crawler does with a URL.

mod domain;
mod normalize;
mod pattern;

use crate::config::Config;
use crate::ConfigError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_host, site_root};
pub use normalize::{normalize_url, resolve_link, UrlLike};
pub use pattern::{lint_blacklist, Blacklist, BlacklistPattern, PatternIssue, PatternIssueKind};

/// Number of digits in an article id
pub const ARTICLE_ID_DIGITS: usize = 12;

/// The 12-digit id embedded in an article URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    /// Accepts exactly [`ARTICLE_ID_DIGITS`] ASCII digits
    pub fn parse(digits: &str) -> Option<Self> {
        (digits.len() == ARTICLE_ID_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope classification of a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeDecision {
    /// Navigation page on the target host - keep crawling
    InDomain,
    /// Different host, secondary host, or non-http scheme
    OutOfDomain,
    /// Path matches a blacklist pattern
    Blacklisted,
    /// Article page - extract it
    ArticleCandidate(ArticleId),
}

impl ScopeDecision {
    /// Returns true if the URL should be fetched
    pub fn should_fetch(&self) -> bool {
        matches!(self, Self::InDomain | Self::ArticleCandidate(_))
    }
}

/// Classifies URLs against the site's scope rules
///
/// The filter is built once per run and never mutated, so classification is
/// a pure function of the URL.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scheme: String,
    host: String,
    secondary_hosts: Vec<String>,
    article_path: Regex,
    blacklist: Blacklist,
}

impl ScopeFilter {
    /// Builds the filter for a target site
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed URL; its scheme is the one article URLs must use
    /// * `host` - Target host
    /// * `secondary_hosts` - Hosts never crawled
    /// * `article_suffix` - Literal text after the article id
    /// * `blacklist` - Path patterns to exclude
    pub fn new<S: AsRef<str>>(
        seed: &Url,
        host: &str,
        secondary_hosts: &[S],
        article_suffix: &str,
        blacklist: &[S],
    ) -> Result<Self, ConfigError> {
        let article_path = Regex::new(&format!(
            r"^/.*-(\d{{{}}}){}$",
            ARTICLE_ID_DIGITS,
            regex::escape(article_suffix)
        ))
        .map_err(|e| ConfigError::InvalidPattern(format!("article shape: {}", e)))?;

        Ok(Self {
            scheme: seed.scheme().to_string(),
            host: host.to_lowercase(),
            secondary_hosts: secondary_hosts
                .iter()
                .map(|h| h.as_ref().to_lowercase())
                .collect(),
            article_path,
            blacklist: Blacklist::new(blacklist),
        })
    }

    /// Builds the filter from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let seed = Url::parse(&config.site.seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL: {}", e)))?;
        Self::new(
            &seed,
            &config.site.host,
            &config.site.secondary_hosts,
            &config.scope.article_suffix,
            &config.scope.blacklist,
        )
    }

    /// Classifies a URL
    ///
    /// Rules are applied in this order:
    /// 1. Not http(s) or not on the target host: `OutOfDomain`
    /// 2. Article shape: `ArticleCandidate`, even if a blacklist pattern matches
    /// 3. Blacklisted path: `Blacklisted`
    /// 4. Everything else: `InDomain`
    ///
    /// # Examples
    ///
    /// ```
    /// use article_harvest::url::{ScopeDecision, ScopeFilter};
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://www.business-standard.com/").unwrap();
    /// let filter = ScopeFilter::new(
    ///     &seed,
    ///     "www.business-standard.com",
    ///     &["hindi.business-standard.com"],
    ///     "_1.html",
    ///     &["/sports"],
    /// )
    /// .unwrap();
    ///
    /// let url = Url::parse("https://www.business-standard.com/sports").unwrap();
    /// assert_eq!(filter.classify(&url), ScopeDecision::Blacklisted);
    /// ```
    pub fn classify(&self, url: &Url) -> ScopeDecision {
        if (url.scheme() != "http" && url.scheme() != "https") || !is_host(url, &self.host) {
            return ScopeDecision::OutOfDomain;
        }

        if let Some(id) = self.article_id(url) {
            if let Some(pattern) = self.blacklist.find(url.path()) {
                tracing::debug!(
                    "Article shape overrides blacklist '{}' for {}",
                    pattern.as_str(),
                    url
                );
            }
            return ScopeDecision::ArticleCandidate(id);
        }

        if self.blacklist.find(url.path()).is_some() {
            return ScopeDecision::Blacklisted;
        }

        ScopeDecision::InDomain
    }

    /// Classifies a URL given as a string or parsed URL
    ///
    /// Anything that does not resolve to an http(s) URL is `OutOfDomain`.
    pub fn classify_url_like(&self, url: impl Into<UrlLike>) -> ScopeDecision {
        match url.into().resolve() {
            Ok(url) => self.classify(&url),
            Err(_) => ScopeDecision::OutOfDomain,
        }
    }

    /// Extracts the article id if the URL has the article shape
    pub fn article_id(&self, url: &Url) -> Option<ArticleId> {
        if url.scheme() != self.scheme || !is_host(url, &self.host) || url.query().is_some() {
            return None;
        }

        self.article_path
            .captures(url.path())
            .and_then(|caps| caps.get(1))
            .map(|m| ArticleId(m.as_str().to_string()))
    }

    /// Returns true if the URL is on a configured secondary host
    pub fn is_secondary_host(&self, url: &Url) -> bool {
        self.secondary_hosts.iter().any(|h| is_host(url, h))
    }

    /// Target host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Number of blacklist patterns in effect
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }
}
