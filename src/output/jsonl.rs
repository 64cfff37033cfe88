//! JSON Lines article sink
//!
//! Appends one JSON object per article to a file, so repeated runs
//! accumulate into the same output. Each line is flushed as it is written,
//! so a killed run keeps every article it reported as extracted.

use crate::crawler::ArticleRecord;
use crate::output::traits::{ArticleSink, OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Sink writing newline-delimited JSON
pub struct JsonLinesSink<W: Write + Send = BufWriter<File>> {
    writer: Mutex<W>,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed
    pub fn open(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|_| OutputError::Write("sink lock poisoned".to_string()))
    }
}

impl<W: Write + Send> ArticleSink for JsonLinesSink<W> {
    fn emit(&self, record: &ArticleRecord) -> OutputResult<()> {
        // Serialize outside the lock; only the write is serialised
        let mut line = serde_json::to_vec(record).map_err(|source| OutputError::Serialize {
            article_id: record.article_id.to_string(),
            source,
        })?;
        line.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write("sink lock poisoned".to_string()))?;
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write("sink lock poisoned".to_string()))?;
        writer.flush()?;
        Ok(())
    }
}
