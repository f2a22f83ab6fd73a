//! Status events streamed from the crawl worker to the front end
//!
//! The worker never touches front-end state. Everything a user should see goes
//! through an ordered channel of [`CrawlEvent`]s: timestamped log lines while
//! the crawl runs and exactly one [`CrawlEvent::Finished`] at the end. A crawl
//! with a manual gate also sends [`CrawlEvent::AwaitingConfirmation`] once the
//! start page is loaded.

use crate::state::FinishReason;
use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LogLine {
    /// Renders as `2024-05-01 12:00:00 - INFO - message` in local time
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.message
        )
    }
}

/// What a finished crawl found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTally {
    Found { total: usize, output_path: PathBuf },
    NoneFound,
}

/// Terminal summary of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub reason: FinishReason,
    pub pages_visited: u32,
    pub tally: LinkTally,
}

impl CrawlSummary {
    /// Result line for front ends, e.g. "Found 12 media files"
    pub fn result_line(&self) -> String {
        match &self.tally {
            LinkTally::Found { total, .. } => format!("Found {} media files", total),
            LinkTally::NoneFound => "No media files found".to_string(),
        }
    }
}

/// Event emitted by the crawl worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    Log(LogLine),
    /// The start page is loaded and the manual gate waits for an answer
    AwaitingConfirmation,
    Finished(CrawlSummary),
}

impl CrawlEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Sending half of the event stream, owned by the crawl worker
///
/// Sends never fail from the worker's point of view: once the front end has
/// dropped its receiver, events are discarded.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<CrawlEvent>,
}

impl Reporter {
    /// Creates a reporter and the receiver the front end drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CrawlEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message.into());
    }

    pub fn awaiting_confirmation(&self) {
        self.emit(CrawlEvent::AwaitingConfirmation);
    }

    pub fn finish(&self, summary: CrawlSummary) {
        self.emit(CrawlEvent::Finished(summary));
    }

    fn log(&self, severity: Severity, message: String) {
        self.emit(CrawlEvent::Log(LogLine {
            at: Utc::now(),
            severity,
            message,
        }));
    }

    fn emit(&self, event: CrawlEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding event");
        }
    }
}
