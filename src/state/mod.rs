//! State module for tracking crawl progress
//!
//! - `PageOutcome`: how processing of each crawl task ended

mod page_state;

pub use page_state::PageOutcome;
