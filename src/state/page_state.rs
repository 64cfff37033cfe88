//! Terminal outcomes of a crawl task
//!
//! Every task handed out by the frontier ends in exactly one of these.

use std::fmt;

/// Represents how processing of a fetched (or unfetchable) URL ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageOutcome {
    // ===== Success States =====
    /// Navigation page fetched and its links enqueued
    Navigated,

    /// Article page fetched and a record emitted
    Extracted,

    // ===== Skip States =====
    /// Page landed on a secondary host and was not parsed
    SkippedHost,

    // ===== Terminal Rejections =====
    /// Server answered with a non-2xx status
    NonSuccessStatus,

    /// Response was not HTML
    ContentMismatch,

    // ===== Transport =====
    /// Transport failed; the request was resubmitted
    RetryScheduled,

    /// Transport failed after the retry; the URL was dropped
    TransportFailed,

    /// The record could not be written to the sink
    SinkFailed,
}

impl PageOutcome {
    /// Returns true if the page was fully processed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Navigated | Self::Extracted)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NonSuccessStatus | Self::ContentMismatch | Self::TransportFailed | Self::SinkFailed
        )
    }

    /// Returns true if the same URL will be fetched again
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::RetryScheduled)
    }

    /// Stable label used in logs and statistics output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigated => "navigated",
            Self::Extracted => "extracted",
            Self::SkippedHost => "skipped_host",
            Self::NonSuccessStatus => "non_success_status",
            Self::ContentMismatch => "content_mismatch",
            Self::RetryScheduled => "retry_scheduled",
            Self::TransportFailed => "transport_failed",
            Self::SinkFailed => "sink_failed",
        }
    }

    /// Returns all possible outcomes
    pub fn all() -> [Self; 8] {
        [
            Self::Navigated,
            Self::Extracted,
            Self::SkippedHost,
            Self::NonSuccessStatus,
            Self::ContentMismatch,
            Self::RetryScheduled,
            Self::TransportFailed,
            Self::SinkFailed,
        ]
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
