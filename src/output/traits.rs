//! Output sink trait and error types
//!
//! This module defines the interface extracted articles are handed to.

use crate::crawler::ArticleRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize article {article_id}: {source}")]
    Serialize {
        article_id: String,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted articles
///
/// Workers call `emit` concurrently; implementations serialise writes
/// internally. Write order is not meaningful, but every record passed in
/// must be written exactly once.
pub trait ArticleSink: Send + Sync {
    /// Hands a finished record to the sink
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted article
    fn emit(&self, record: &ArticleRecord) -> OutputResult<()>;

    /// Flushes buffered records to durable storage
    fn flush(&self) -> OutputResult<()> {
        Ok(())
    }
}
