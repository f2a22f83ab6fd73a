//! Result sink trait and the append-only file sink
//!
//! The crawl worker hands each batch of newly discovered links to a sink. The
//! file sink appends them, sorted, one per line, so repeated runs accumulate.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for result sinks
///
/// A sink is written only by the crawl worker, never concurrently.
pub trait ResultSink: Send + Sync {
    /// Persists a batch of links
    ///
    /// # Arguments
    ///
    /// * `links` - Links not persisted before during this crawl
    fn append(&mut self, links: &[String]) -> OutputResult<()>;

    /// Where the links end up, for summaries
    fn location(&self) -> &Path;
}

/// Appends links to a UTF-8 text file, one per line
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for FileSink {
    /// Opens the file in append mode and writes the batch sorted lexicographically
    fn append(&mut self, links: &[String]) -> OutputResult<()> {
        let mut batch: Vec<&String> = links.iter().collect();
        batch.sort();

        let wrap = |source| OutputError::Write {
            path: self.path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;
        let mut writer = BufWriter::new(file);

        for link in batch {
            writeln!(writer, "{}", link).map_err(wrap)?;
        }
        writer.flush().map_err(wrap)?;

        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
