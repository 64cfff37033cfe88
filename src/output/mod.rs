//! Output module for extracted articles and crawl reports
//!
//! This module handles:
//! - The sink interface extracted articles are written through
//! - The JSON Lines sink used by the binary
//! - Recording and printing crawl statistics

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use stats::{print_statistics, CrawlStatistics, StatisticsSnapshot};
pub use traits::{ArticleSink, OutputError, OutputResult};
