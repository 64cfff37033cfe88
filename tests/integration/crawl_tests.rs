//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use article_harvest::config::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, ScopeConfig, SiteConfig,
    UserAgentConfig,
};
use article_harvest::crawler::{ArticleRecord, Coordinator, FixedUserAgent, RunOutcome};
use article_harvest::output::{ArticleSink, JsonLinesSink, OutputError, OutputResult};
use article_harvest::PageOutcome;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_AGENT: &str = "HarvestTest/1.0";

/// Sink that keeps every record in memory
#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<ArticleRecord>>,
}

impl CollectingSink {
    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.article_id.to_string())
            .collect();
        ids.sort();
        ids
    }
}

impl ArticleSink for CollectingSink {
    fn emit(&self, record: &ArticleRecord) -> OutputResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Sink that rejects every record
struct FailingSink;

impl ArticleSink for FailingSink {
    fn emit(&self, _record: &ArticleRecord) -> OutputResult<()> {
        Err(OutputError::Write("disk full".to_string()))
    }
}

/// Creates a test configuration targeting the mock server
fn create_test_config(base_url: &str, blacklist: &[&str]) -> Config {
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        site: SiteConfig {
            host,
            seed: format!("{}/", base_url),
            secondary_hosts: vec![],
        },
        scope: ScopeConfig {
            blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
            ..ScopeConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            request_delay_ms: 0,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig::default(),
        extraction: ExtractionConfig::default(),
        output: OutputConfig {
            path: "unused.jsonl".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        },
    }
}

fn coordinator(config: Config, sink: Arc<dyn ArticleSink>) -> Coordinator {
    Coordinator::with_user_agents(
        config,
        sink,
        Arc::new(FixedUserAgent(TEST_AGENT.to_string())),
    )
    .expect("Failed to create coordinator")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn article_page(headline: &str, modified: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type":"NewsArticle","headline":"{}","articleBody":"Body of {}",
              "dateModified":"{}","keywords":"markets, economy"}}
            </script></head><body><h1>ignored</h1></body></html>"#,
            headline, headline, modified
        ),
        "text/html",
    )
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Seed links to a section, an article, a blacklisted section and another site
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/markets">Markets</a>
               <a href="/markets/stocks-rally-123456789012_1.html">Rally</a>
               <a href="/sports/cricket">Cricket</a>
               <a href="https://example.com/elsewhere">Elsewhere</a>
               <a href="/markets#top">Markets again</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Section links back to the seed, repeats the first article and adds a second
    Mock::given(method("GET"))
        .and(path("/markets"))
        .respond_with(html(
            r#"<a href="/">Home</a>
               <a href="/markets/stocks-rally-123456789012_1.html">Rally</a>
               <a href="/economy/gdp-grows-210987654321_1.html">GDP</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/markets/stocks-rally-123456789012_1.html"))
        .respond_with(article_page("Stocks rally", "2024-03-01T10:15:00+0530"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // No structured data: title and body come from the fallback selectors
    Mock::given(method("GET"))
        .and(path("/economy/gdp-grows-210987654321_1.html"))
        .respond_with(html(
            r#"<h1>GDP grows</h1><div class="p-content"><p>Growth beat</p><p>estimates.</p></div>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sports/cricket"))
        .respond_with(html("blacklisted"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let sink = Arc::new(CollectingSink::default());
    let config = create_test_config(&base_url, &["/sports"]);
    let report = coordinator(config, sink.clone())
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(sink.ids(), vec!["123456789012", "210987654321"]);

    let records = sink.records.lock().unwrap();
    let rally = records
        .iter()
        .find(|r| r.article_id.as_str() == "123456789012")
        .unwrap();
    assert_eq!(rally.title, "Stocks rally");
    assert_eq!(rally.body, "Body of Stocks rally");
    assert_eq!(rally.updated_at, "2024-03-01 10:15:00");
    assert_eq!(rally.keywords, vec!["markets", "economy"]);
    assert_eq!(
        rally.url,
        format!("{}/markets/stocks-rally-123456789012_1.html", base_url)
    );

    let gdp = records
        .iter()
        .find(|r| r.article_id.as_str() == "210987654321")
        .unwrap();
    assert_eq!(gdp.title, "GDP grows");
    assert_eq!(gdp.body, "Growth beat estimates.");
    assert!(gdp.updated_at_is_fallback);

    let stats = &report.statistics;
    assert_eq!(stats.count(PageOutcome::Navigated), 2);
    assert_eq!(stats.articles(), 2);
    assert_eq!(stats.errors(), 0);
    assert_eq!(stats.urls_claimed, 4);
}

#[tokio::test]
async fn test_request_headers_and_referer_chain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The seed is requested with the site root as referer
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", TEST_AGENT))
        .and(header("referer", format!("{}/", base_url).as_str()))
        .respond_with(html(r#"<a href="/markets">Markets</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/markets"))
        .and(header("referer", format!("{}/", base_url).as_str()))
        .respond_with(html(r#"<a href="/markets/deep">Deep</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/markets/deep"))
        .and(header("referer", format!("{}/markets", base_url).as_str()))
        .respond_with(html("leaf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = coordinator(
        create_test_config(&base_url, &[]),
        Arc::new(CollectingSink::default()),
    )
    .run()
    .await
    .expect("Crawl failed");

    assert_eq!(report.statistics.count(PageOutcome::Navigated), 3);
}

#[tokio::test]
async fn test_rejected_responses_are_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/missing">Missing</a><a href="/report.pdf">Report</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = coordinator(
        create_test_config(&base_url, &[]),
        Arc::new(CollectingSink::default()),
    )
    .run()
    .await
    .expect("Crawl failed");

    let stats = &report.statistics;
    assert_eq!(stats.count(PageOutcome::NonSuccessStatus), 1);
    assert_eq!(stats.count(PageOutcome::ContentMismatch), 1);
    assert_eq!(stats.count(PageOutcome::RetryScheduled), 0);
    assert_eq!(stats.errors(), 2);
}

#[tokio::test]
async fn test_transport_failure_retried_once_with_cache_busting() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/slow">Slow</a>"#))
        .mount(&mock_server)
        .await;

    // The retry carries no-cache; mounted first so it wins when both match
    Mock::given(method("GET"))
        .and(path("/slow"))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .respond_with(html("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &[]);
    config.crawler.request_timeout_secs = 1;

    let report = coordinator(config, Arc::new(CollectingSink::default()))
        .run()
        .await
        .expect("Crawl failed");

    let stats = &report.statistics;
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(stats.count(PageOutcome::RetryScheduled), 1);
    assert_eq!(stats.count(PageOutcome::TransportFailed), 1);
}

#[tokio::test]
async fn test_cancellation_stops_new_fetches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/markets">Markets</a>"#).set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/markets"))
        .respond_with(html("never fetched"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coordinator = coordinator(
        create_test_config(&base_url, &[]),
        Arc::new(CollectingSink::default()),
    );
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    // The in-flight seed still finished
    assert_eq!(report.statistics.count(PageOutcome::Navigated), 1);
}

#[tokio::test]
async fn test_cancellation_during_request_delay_skips_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("never fetched"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &[]);
    config.crawler.request_delay_ms = 5_000;
    let coordinator = coordinator(config, Arc::new(CollectingSink::default()));
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(2), coordinator.run())
        .await
        .expect("Cancelled crawl kept waiting out the delay")
        .expect("Crawl failed");

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.statistics.pages_by_outcome.is_empty());
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_sink_failure_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a/one-111111111111_1.html">1</a><a href="/b/two-222222222222_1.html">2</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a/one-111111111111_1.html"))
        .respond_with(article_page("One", "2024-01-01T00:00:00+0000"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b/two-222222222222_1.html"))
        .respond_with(article_page("Two", "2024-01-01T00:00:00+0000"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = coordinator(create_test_config(&base_url, &[]), Arc::new(FailingSink))
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.statistics.count(PageOutcome::SinkFailed), 2);
    assert_eq!(report.statistics.articles(), 0);
}

#[tokio::test]
async fn test_articles_appended_as_json_lines() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/markets/stocks-rally-123456789012_1.html">Rally</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/markets/stocks-rally-123456789012_1.html"))
        .respond_with(article_page("Stocks rally", "2024-03-01T10:15:00+0530"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("articles.jsonl");

    let sink = Arc::new(JsonLinesSink::open(&output).unwrap());
    coordinator(create_test_config(&base_url, &[]), sink)
        .run()
        .await
        .expect("Crawl failed");

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["article_id"], "123456789012");
    assert_eq!(record["title"], "Stocks rally");
    assert_eq!(record["updated_at"], "2024-03-01 10:15:00");
}

#[tokio::test]
async fn test_unresolvable_seed_host() {
    let config = create_test_config("http://harvest-seed.invalid", &[]);
    let result = coordinator(config, Arc::new(CollectingSink::default()))
        .run()
        .await;

    assert!(matches!(
        result,
        Err(article_harvest::HarvestError::UnresolvableHost { .. })
    ));
}
