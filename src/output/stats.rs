//! Crawl statistics
//!
//! Counters are shared by all workers and updated lock-free; a snapshot is
//! taken for progress logging and the final report.

use crate::state::PageOutcome;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters for one crawl run
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    urls_claimed: AtomicU64,
    links_seen: AtomicU64,
    outcomes: [AtomicU64; 8],
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL claimed by the frontier
    pub fn url_claimed(&self) {
        self.urls_claimed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records links found on a navigation page
    pub fn links_seen(&self, count: usize) {
        self.links_seen.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Records how a task ended
    pub fn record(&self, outcome: PageOutcome) {
        self.outcomes[outcome as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Number of tasks finished so far, retries excluded
    pub fn pages_finished(&self) -> u64 {
        PageOutcome::all()
            .iter()
            .filter(|o| !o.is_retry())
            .map(|o| self.outcomes[*o as usize].load(Ordering::Relaxed))
            .sum()
    }

    /// Takes a consistent-enough copy of the counters
    pub fn snapshot(&self, elapsed: Duration) -> StatisticsSnapshot {
        let mut pages_by_outcome = BTreeMap::new();
        for outcome in PageOutcome::all() {
            let count = self.outcomes[outcome as usize].load(Ordering::Relaxed);
            if count > 0 {
                pages_by_outcome.insert(outcome, count);
            }
        }

        StatisticsSnapshot {
            urls_claimed: self.urls_claimed.load(Ordering::Relaxed),
            links_seen: self.links_seen.load(Ordering::Relaxed),
            pages_by_outcome,
            elapsed,
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    /// URLs claimed by the frontier (seed included)
    pub urls_claimed: u64,

    /// Links seen on navigation pages, before scope filtering
    pub links_seen: u64,

    /// Count of tasks by outcome
    pub pages_by_outcome: BTreeMap<PageOutcome, u64>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl StatisticsSnapshot {
    pub fn count(&self, outcome: PageOutcome) -> u64 {
        self.pages_by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Articles written to the sink
    pub fn articles(&self) -> u64 {
        self.count(PageOutcome::Extracted)
    }

    /// Terminal error count
    pub fn errors(&self) -> u64 {
        self.pages_by_outcome
            .iter()
            .filter(|(o, _)| o.is_error())
            .map(|(_, c)| c)
            .sum()
    }

    /// Pages per second over the run
    pub fn rate(&self) -> f64 {
        let finished: u64 = self
            .pages_by_outcome
            .iter()
            .filter(|(o, _)| !o.is_retry())
            .map(|(_, c)| c)
            .sum();
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            finished as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StatisticsSnapshot) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs claimed: {}", stats.urls_claimed);
    println!("  Links seen: {}", stats.links_seen);
    println!("  Articles extracted: {}", stats.articles());
    println!("  Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Pages by Outcome:");
    let mut outcome_counts: Vec<_> = stats.pages_by_outcome.iter().collect();
    outcome_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (outcome, count) in outcome_counts {
        println!("  {}: {}", outcome, count);
    }
    println!();

    println!(
        "Errors: {} ({:.2} pages/sec)",
        stats.errors(),
        stats.rate()
    );
}
