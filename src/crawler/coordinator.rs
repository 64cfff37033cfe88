//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Checking that the seed host resolves before any work starts
//! - Seeding the frontier and running a fixed pool of workers
//! - Dispatching each fetched page to link discovery or article extraction
//! - Scheduling the single retry for transport failures
//! - Handling cancellation and reporting the final statistics

use crate::config::{validate, Config};
use crate::crawler::article::ArticleExtractor;
use crate::crawler::fetcher::{build_http_client, FetchResult, FetchedPage, Fetcher, RequestContext};
use crate::crawler::frontier::{CrawlTask, Frontier, TaskKind};
use crate::crawler::parser::on_navigation_page;
use crate::crawler::user_agent::{RotatingUserAgents, UserAgentSource};
use crate::output::{ArticleSink, CrawlStatistics, StatisticsSnapshot};
use crate::state::PageOutcome;
use crate::url::{normalize_url, site_root, ArticleId, ScopeDecision, ScopeFilter};
use crate::HarvestError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress is logged every this many finished pages
const PROGRESS_INTERVAL: u64 = 25;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The frontier drained
    Completed,
    /// The cancellation token fired first
    Cancelled,
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: RunOutcome,
    pub statistics: StatisticsSnapshot,
}

/// State shared by every worker
struct Shared {
    config: Arc<Config>,
    scope: ScopeFilter,
    frontier: Frontier,
    fetcher: Fetcher,
    extractor: ArticleExtractor,
    sink: Arc<dyn ArticleSink>,
    stats: CrawlStatistics,
    cancel: CancellationToken,
    started: Instant,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    shared: Arc<Shared>,
    seed: Url,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator using the configured user agent pool
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `sink` - Destination for extracted articles
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, sink: Arc<dyn ArticleSink>) -> Result<Self, HarvestError> {
        let user_agents = Arc::new(RotatingUserAgents::from_config(&config.user_agent));
        Self::with_user_agents(config, sink, user_agents)
    }

    /// Creates a coordinator with an explicit user agent source
    ///
    /// The configuration is validated here as well, so a `Config` built in
    /// code gets the same checks as one loaded from a file.
    pub fn with_user_agents(
        config: Config,
        sink: Arc<dyn ArticleSink>,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Result<Self, HarvestError> {
        for issue in validate(&config)? {
            tracing::debug!("Blacklist pattern {}", issue);
        }

        let cancel = CancellationToken::new();
        let seed = normalize_url(&config.site.seed)?;
        let scope = ScopeFilter::from_config(&config)?;
        let extractor = ArticleExtractor::from_config(&config)?;
        let client = build_http_client(&config.crawler)?;
        let fetcher = Fetcher::new(client, user_agents, site_root(&seed));

        Ok(Self {
            shared: Arc::new(Shared {
                config: Arc::new(config),
                scope,
                frontier: Frontier::new(),
                fetcher,
                extractor,
                sink,
                stats: CrawlStatistics::new(),
                cancel: cancel.clone(),
                started: Instant::now(),
            }),
            seed,
            cancel,
        })
    }

    /// Token that stops the crawl when cancelled
    ///
    /// In-flight fetches finish; nothing new is started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current statistics
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.shared.stats.snapshot(self.shared.started.elapsed())
    }

    /// Runs the crawl until the frontier drains or the run is cancelled
    ///
    /// This is the core crawling logic that:
    /// 1. Resolves the seed host (fatal if it does not resolve)
    /// 2. Claims and enqueues the seed
    /// 3. Spawns `max-concurrent-requests` workers
    /// 4. Waits for every worker to finish
    /// 5. Flushes the sink
    ///
    /// Page-level failures are logged and counted, never returned.
    pub async fn run(&self) -> Result<CrawlReport, HarvestError> {
        let shared = &self.shared;
        resolve_host(&self.seed).await?;

        tracing::info!(
            "Starting crawl of {} from {} ({} blacklist patterns, {} workers)",
            shared.scope.host(),
            self.seed,
            shared.scope.blacklist_len(),
            shared.config.crawler.max_concurrent_requests
        );

        if shared.frontier.try_claim(&self.seed) {
            shared.stats.url_claimed();
            let request = RequestContext::seed(self.seed.clone());
            let task = match shared.scope.classify(&self.seed) {
                ScopeDecision::ArticleCandidate(id) => CrawlTask::article(request, id),
                _ => CrawlTask::navigate(request),
            };
            shared.frontier.enqueue(task);
        }

        if self.cancel.is_cancelled() {
            shared.frontier.stop();
        }

        let watcher = {
            let shared = shared.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                tracing::info!("Cancellation requested, finishing in-flight pages");
                shared.frontier.stop();
            })
        };

        let mut workers = JoinSet::new();
        for worker_id in 0..shared.config.crawler.max_concurrent_requests {
            workers.spawn(worker_loop(shared.clone(), worker_id));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                let error = HarvestError::Worker(e.to_string());
                tracing::error!("{}", error);
            }
        }
        watcher.abort();

        shared.sink.flush()?;

        let outcome = if self.cancel.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };
        let statistics = self.statistics();

        tracing::info!(
            "Crawl {}: {} articles, {} URLs claimed, {} errors in {:.1}s",
            match outcome {
                RunOutcome::Completed => "completed",
                RunOutcome::Cancelled => "cancelled",
            },
            statistics.articles(),
            statistics.urls_claimed,
            statistics.errors(),
            statistics.elapsed.as_secs_f64()
        );

        Ok(CrawlReport {
            outcome,
            statistics,
        })
    }
}

/// Fails if the seed's host has no address
async fn resolve_host(seed: &Url) -> Result<(), HarvestError> {
    let host = seed.host_str().unwrap_or_default().to_string();
    let port = seed.port_or_known_default().unwrap_or(80);

    let unresolvable = |message: String| HarvestError::UnresolvableHost {
        host: host.clone(),
        message,
    };

    let mut addresses = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| unresolvable(e.to_string()))?;

    match addresses.next() {
        Some(address) => {
            tracing::debug!("Resolved {} to {}", host, address.ip());
            Ok(())
        }
        None => Err(unresolvable("no addresses returned".to_string())),
    }
}

async fn worker_loop(shared: Arc<Shared>, worker_id: u32) {
    tracing::trace!("Worker {} started", worker_id);

    while let Some(lease) = shared.frontier.next().await {
        let Some(outcome) = shared.process(lease.task()).await else {
            continue;
        };
        shared.stats.record(outcome);
        drop(lease);

        if !outcome.is_retry() {
            let finished = shared.stats.pages_finished();
            if finished % PROGRESS_INTERVAL == 0 {
                let elapsed = shared.started.elapsed();
                tracing::info!(
                    "Progress: {} pages processed, {} queued, {} URLs claimed, {:.2} pages/sec",
                    finished,
                    shared.frontier.pending(),
                    shared.frontier.claimed_count(),
                    finished as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }
    }

    tracing::trace!("Worker {} finished", worker_id);
}

impl Shared {
    /// Fetches one task and handles the response
    ///
    /// Returns `None` without fetching when the run is cancelled before the
    /// request goes out, including while waiting out the request delay.
    async fn process(&self, task: &CrawlTask) -> Option<PageOutcome> {
        let delay = self.config.crawler.request_delay_ms;
        if delay > 0 {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            }
        }

        if self.cancel.is_cancelled() {
            tracing::debug!("Cancelled before fetching {}", task.url());
            return None;
        }

        tracing::debug!("Fetching {}", task.url());

        let outcome = match self.fetcher.fetch(&task.request).await {
            FetchResult::Success(page) => match &task.kind {
                TaskKind::Navigate => self.handle_navigation(&page),
                TaskKind::Article(id) => self.handle_article(&page, task.url(), id.clone()),
            },

            FetchResult::Rejected(rejection) => {
                tracing::warn!("Skipping {}: {}", task.url(), rejection);
                rejection.outcome()
            }

            FetchResult::Failure { reason, request } => match request.retry() {
                Some(retry) => {
                    tracing::warn!("Request to {} failed ({}), retrying", task.url(), reason);
                    if self.frontier.enqueue(task.with_request(retry)) {
                        PageOutcome::RetryScheduled
                    } else {
                        PageOutcome::TransportFailed
                    }
                }
                None => {
                    tracing::error!("Giving up on {}: {}", task.url(), reason);
                    PageOutcome::TransportFailed
                }
            },
        };
        Some(outcome)
    }

    fn handle_navigation(&self, page: &FetchedPage) -> PageOutcome {
        let mut tasks = on_navigation_page(page, &self.scope, &self.frontier);
        if tasks.skipped_host() {
            return PageOutcome::SkippedHost;
        }

        let links_found = tasks.links_found();
        let mut scheduled = 0;
        for task in tasks.by_ref() {
            self.stats.url_claimed();
            if self.frontier.enqueue(task) {
                scheduled += 1;
            }
        }
        self.stats.links_seen(links_found);

        tracing::debug!(
            "{}: {} links, {} newly scheduled",
            page.final_url,
            links_found,
            scheduled
        );
        PageOutcome::Navigated
    }

    fn handle_article(&self, page: &FetchedPage, url: &Url, article_id: ArticleId) -> PageOutcome {
        let record = self.extractor.extract(page, url, article_id);
        if record.updated_at_is_fallback {
            tracing::warn!(
                "No usable date on article {}, using extraction time",
                record.article_id
            );
        }

        match self.sink.emit(&record) {
            Ok(()) => {
                tracing::info!("Extracted article {}: {}", record.article_id, record.title);
                PageOutcome::Extracted
            }
            Err(e) => {
                tracing::error!("Failed to write article {}: {}", record.article_id, e);
                PageOutcome::SinkFailed
            }
        }
    }
}
