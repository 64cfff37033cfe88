//! Article extraction
//!
//! Article pages carry a `NewsArticle` JSON-LD block that is the preferred
//! source for every field. The configured heading and content selectors are
//! used when the block is missing or lacks a field.

use crate::config::{Config, ExtractionConfig};
use crate::crawler::fetcher::FetchedPage;
use crate::crawler::parser::select_text;
use crate::url::ArticleId;
use crate::ConfigError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local};
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Accepted layouts for `dateModified` / `datePublished`
const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%:z"];

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

const NEWS_ARTICLE: &str = "NewsArticle";

/// One extracted article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub article_id: ArticleId,
    pub url: String,
    pub title: String,
    pub body: String,
    pub updated_at: String,
    pub keywords: Vec<String>,

    /// Set when `updated_at` is the extraction time rather than a page date
    #[serde(skip)]
    pub updated_at_is_fallback: bool,
}

#[cfg(test)]
impl ArticleRecord {
    pub(crate) fn new_for_test(
        id: &str,
        title: &str,
        body: &str,
        updated_at: &str,
        keywords: &[&str],
    ) -> Self {
        let article_id = ArticleId::parse(id).expect("test article id must be 12 digits");
        Self {
            url: format!("https://www.business-standard.com/test/story-{}_1.html", id),
            article_id,
            title: title.to_string(),
            body: body.to_string(),
            updated_at: updated_at.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            updated_at_is_fallback: false,
        }
    }
}

/// Returns true if `format` is a usable strftime format
pub(crate) fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Builds [`ArticleRecord`]s from article pages
#[derive(Debug)]
pub struct ArticleExtractor {
    heading: Selector,
    content: Selector,
    json_ld: Selector,
    date_format: String,
}

impl ArticleExtractor {
    /// # Arguments
    ///
    /// * `config` - Fallback selectors
    /// * `date_format` - strftime format for `updated_at`
    pub fn new(config: &ExtractionConfig, date_format: &str) -> Result<Self, ConfigError> {
        if !is_valid_date_format(date_format) {
            return Err(ConfigError::InvalidDateFormat(date_format.to_string()));
        }

        Ok(Self {
            heading: parse_selector(&config.heading_selector)?,
            content: parse_selector(&config.content_selector)?,
            json_ld: parse_selector(JSON_LD_SELECTOR)?,
            date_format: date_format.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.extraction, &config.output.date_format)
    }

    /// Extracts the article from a fetched page
    pub fn extract(&self, page: &FetchedPage, url: &Url, article_id: ArticleId) -> ArticleRecord {
        self.extract_html(&page.body, url, article_id)
    }

    /// Extracts the article from raw HTML
    ///
    /// Field sources, in order of preference:
    ///
    /// | Field | Structured data | Fallback |
    /// |-------|-----------------|----------|
    /// | title | `headline` | first heading selector match |
    /// | body | `articleBody` | text of content selector matches, inline markup included, joined by spaces |
    /// | updated_at | `dateModified`, `datePublished` | extraction time |
    /// | keywords | `keywords` | none |
    ///
    /// Missing fields become empty strings; extraction never fails.
    pub fn extract_html(&self, html: &str, url: &Url, article_id: ArticleId) -> ArticleRecord {
        let document = Html::parse_document(html);
        let structured = self.find_news_article(&document);
        let structured = structured.as_ref();

        let title = string_field(structured, "headline").unwrap_or_else(|| {
            select_text(&document, &self.heading)
                .into_iter()
                .next()
                .unwrap_or_default()
        });

        let body = string_field(structured, "articleBody")
            .unwrap_or_else(|| select_text(&document, &self.content).join(" "));

        let page_date = string_field(structured, "dateModified")
            .and_then(|d| parse_date(&d))
            .or_else(|| string_field(structured, "datePublished").and_then(|d| parse_date(&d)));

        let (updated_at, updated_at_is_fallback) = match page_date {
            Some(date) => (date.format(&self.date_format).to_string(), false),
            None => (Local::now().format(&self.date_format).to_string(), true),
        };

        let keywords = keywords(structured.and_then(|s| s.get("keywords")));

        ArticleRecord {
            article_id,
            url: url.to_string(),
            title,
            body,
            updated_at,
            keywords,
            updated_at_is_fallback,
        }
    }

    /// First JSON-LD object whose `@type` is (or includes) `NewsArticle`
    fn find_news_article(&self, document: &Html) -> Option<Map<String, Value>> {
        document
            .select(&self.json_ld)
            .filter_map(|script| {
                let raw = script.text().collect::<String>();
                match serde_json::from_str::<Value>(raw.trim()) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                        None
                    }
                }
            })
            .flat_map(|value| match value {
                Value::Array(items) => items,
                other => vec![other],
            })
            .find_map(|value| match value {
                Value::Object(map) if is_news_article(&map) => Some(map),
                _ => None,
            })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn is_news_article(object: &Map<String, Value>) -> bool {
    match object.get("@type") {
        Some(Value::String(t)) => t == NEWS_ARTICLE,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(NEWS_ARTICLE)),
        _ => false,
    }
}

/// Non-empty trimmed string value of `key`
fn string_field(object: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    object?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parses an ISO-8601 timestamp with offset, keeping the offset
fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
}

/// Keywords from a comma-separated string or an array of strings
fn keywords(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(list)) => list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    fn create_test_extractor() -> ArticleExtractor {
        ArticleExtractor::new(&ExtractionConfig::default(), DATE_FORMAT).unwrap()
    }

    fn article_url() -> Url {
        Url::parse("https://www.business-standard.com/markets/news/stocks-rally-123456789012_1.html")
            .unwrap()
    }

    fn id() -> ArticleId {
        ArticleId::parse("123456789012").unwrap()
    }

    fn json_ld(block: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">{}</script></head>
            <body><h1>Page heading</h1><div class="p-content"><p>First.</p><p>Second.</p></div></body></html>"#,
            block
        )
    }

    #[test]
    fn test_structured_data_preferred() {
        let html = json_ld(
            r#"{"@type":"NewsArticle","headline":"Markets rally","articleBody":"Stocks rose.",
                "dateModified":"2024-03-01T10:15:00+0530","keywords":"markets, stocks"}"#,
        );
        let record = create_test_extractor().extract_html(&html, &article_url(), id());

        assert_eq!(record.article_id, id());
        assert_eq!(record.url, article_url().as_str());
        assert_eq!(record.title, "Markets rally");
        assert_eq!(record.body, "Stocks rose.");
        assert_eq!(record.updated_at, "2024-03-01 10:15:00");
        assert_eq!(record.keywords, vec!["markets", "stocks"]);
        assert!(!record.updated_at_is_fallback);
    }

    #[test]
    fn test_fallback_selectors_without_structured_data() {
        let html = r#"<html><body><h1> Page heading </h1>
            <div class="p-content"><p>First.</p><p>Second.</p></div></body></html>"#;
        let before = Local::now().naive_local();
        let record = create_test_extractor().extract_html(html, &article_url(), id());

        assert_eq!(record.title, "Page heading");
        assert_eq!(record.body, "First. Second.");
        assert!(record.keywords.is_empty());
        assert!(record.updated_at_is_fallback);

        let stamped = NaiveDateTime::parse_from_str(&record.updated_at, DATE_FORMAT).unwrap();
        let drift = (stamped - before).num_seconds().abs();
        assert!(drift <= 5, "fallback timestamp drifted {}s", drift);
    }

    #[test]
    fn test_fallback_body_keeps_inline_markup_text() {
        let html = r#"<html><body><div class="p-content">
            <p>Sensex <b>gained</b> 400 points, <a href="/markets">markets</a> said.</p>
            <p>   </p><p>Nifty closed higher.</p></div></body></html>"#;
        let record = create_test_extractor().extract_html(html, &article_url(), id());
        assert_eq!(
            record.body,
            "Sensex gained 400 points, markets said. Nifty closed higher."
        );
    }

    #[test]
    fn test_date_modified_with_colon_offset() {
        let html = json_ld(r#"{"@type":"NewsArticle","dateModified":"2024-03-01T10:00:00+05:30"}"#);
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.updated_at, "2024-03-01 10:00:00");
        assert!(!record.updated_at_is_fallback);
    }

    #[test]
    fn test_date_published_when_modified_missing() {
        let html = json_ld(r#"{"@type":"NewsArticle","datePublished":"2023-12-31T23:59:59+00:00"}"#);
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.updated_at, "2023-12-31 23:59:59");
        assert!(!record.updated_at_is_fallback);
    }

    #[test]
    fn test_unparseable_modified_date_uses_published() {
        let html = json_ld(
            r#"{"@type":"NewsArticle","dateModified":"yesterday","datePublished":"2024-01-02T03:04:05+0530"}"#,
        );
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.updated_at, "2024-01-02 03:04:05");
    }

    #[test]
    fn test_partial_structured_data_mixes_sources() {
        let html = json_ld(r#"{"@type":"NewsArticle","headline":"Only a headline"}"#);
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.title, "Only a headline");
        assert_eq!(record.body, "First. Second.");
        assert!(record.updated_at_is_fallback);
    }

    #[test]
    fn test_other_types_ignored() {
        let html = json_ld(r#"{"@type":"BreadcrumbList","headline":"Not this"}"#);
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.title, "Page heading");
    }

    #[test]
    fn test_type_array_and_top_level_array() {
        let html = json_ld(
            r#"[{"@type":"WebPage"},{"@type":["Article","NewsArticle"],"headline":"From array"}]"#,
        );
        let record = create_test_extractor().extract_html(&html, &article_url(), id());
        assert_eq!(record.title, "From array");
    }

    #[test]
    fn test_malformed_json_ld_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">{"@type":"NewsArticle","headline":"Second block"}</script>
            </head><body></body></html>"#;
        let record = create_test_extractor().extract_html(html, &article_url(), id());
        assert_eq!(record.title, "Second block");
    }

    #[test]
    fn test_keywords_array_and_empty_entries() {
        assert_eq!(
            keywords(Some(&serde_json::json!("a, ,b,"))),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            keywords(Some(&serde_json::json!(["x", 3, " y "]))),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(keywords(Some(&serde_json::json!(42))).is_empty());
        assert!(keywords(None).is_empty());
    }

    #[test]
    fn test_empty_page_yields_empty_fields() {
        let record = create_test_extractor().extract_html("", &article_url(), id());
        assert_eq!(record.title, "");
        assert_eq!(record.body, "");
        assert!(record.updated_at_is_fallback);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = json_ld(
            r#"{"@type":"NewsArticle","headline":"Same","articleBody":"Body",
                "dateModified":"2024-03-01T10:15:00+0530","keywords":["k"]}"#,
        );
        let extractor = create_test_extractor();
        assert_eq!(
            extractor.extract_html(&html, &article_url(), id()),
            extractor.extract_html(&html, &article_url(), id())
        );
    }

    #[test]
    fn test_output_format_keeps_source_offset() {
        let extractor =
            ArticleExtractor::new(&ExtractionConfig::default(), "%Y-%m-%dT%H:%M:%S%:z").unwrap();
        let html = json_ld(r#"{"@type":"NewsArticle","dateModified":"2024-03-01T10:15:00+0530"}"#);
        let record = extractor.extract_html(&html, &article_url(), id());
        assert_eq!(record.updated_at, "2024-03-01T10:15:00+05:30");
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(matches!(
            ArticleExtractor::new(&ExtractionConfig::default(), "%Q"),
            Err(ConfigError::InvalidDateFormat(_))
        ));

        let bad = ExtractionConfig {
            heading_selector: "h1[".to_string(),
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            ArticleExtractor::new(&bad, DATE_FORMAT),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
