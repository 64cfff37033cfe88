//! HTML parsing for navigation pages
//!
//! This module handles:
//! - Small selector-based queries used by the article extractor
//! - Extracting followable links from a page
//! - Turning a navigation page into new crawl tasks

use crate::crawler::fetcher::{FetchedPage, RequestContext};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::url::{resolve_link, ScopeDecision, ScopeFilter};
use scraper::{Html, Selector};
use url::Url;

/// Values of `attribute` on every element matching `selector`, in document order
pub fn select_attribute(document: &Html, selector: &Selector, attribute: &str) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::to_string)
        .collect()
}

/// Trimmed text of every element matching `selector`, empty ones skipped
pub fn select_text(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Extracts all followable links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// Relative links are resolved against `base_url` and fragments are dropped.
/// Duplicates are kept; the frontier deduplicates.
///
/// # Example
///
/// ```
/// use article_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/markets">Markets</a></body></html>"#;
/// let base_url = Url::parse("https://www.business-standard.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://www.business-standard.com/markets");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Classifies the links of a navigation page into new crawl tasks
///
/// Pages that ended up on a secondary host (after redirects) are skipped
/// entirely. For every other page, each link is classified; out-of-domain
/// and blacklisted links are dropped, and the rest are claimed in the
/// frontier. Only links this call claims become tasks, so a URL found on
/// many pages is scheduled once.
///
/// Links are parsed eagerly; classification and claiming happen as the
/// returned iterator is consumed.
pub fn on_navigation_page<'a>(
    page: &FetchedPage,
    scope: &'a ScopeFilter,
    frontier: &'a Frontier,
) -> LinkTasks<'a> {
    let skipped_host = scope.is_secondary_host(&page.final_url);
    let links = if skipped_host {
        tracing::debug!("Not following links on secondary host page {}", page.final_url);
        Vec::new()
    } else {
        extract_links(&page.body, &page.final_url)
    };

    LinkTasks {
        links_found: links.len(),
        links: links.into_iter(),
        referer: page.final_url.clone(),
        scope,
        frontier,
        skipped_host,
    }
}

/// Lazily yields the crawl tasks for one navigation page
#[derive(Debug)]
pub struct LinkTasks<'a> {
    links: std::vec::IntoIter<Url>,
    referer: Url,
    scope: &'a ScopeFilter,
    frontier: &'a Frontier,
    links_found: usize,
    skipped_host: bool,
}

impl LinkTasks<'_> {
    /// Links extracted from the page, before filtering
    pub fn links_found(&self) -> usize {
        self.links_found
    }

    /// True if the page was on a secondary host and not parsed
    pub fn skipped_host(&self) -> bool {
        self.skipped_host
    }
}

impl Iterator for LinkTasks<'_> {
    type Item = CrawlTask;

    fn next(&mut self) -> Option<CrawlTask> {
        for url in self.links.by_ref() {
            let decision = self.scope.classify(&url);
            if !decision.should_fetch() {
                tracing::trace!("Dropping {:?} link {}", decision, url);
                continue;
            }

            if !self.frontier.try_claim(&url) {
                continue;
            }

            let request = RequestContext::child(url, &self.referer);
            return Some(match decision {
                ScopeDecision::ArticleCandidate(id) => CrawlTask::article(request, id),
                _ => CrawlTask::navigate(request),
            });
        }
        None
    }
}
