//! Output module for crawl results and status
//!
//! This module handles:
//! - Appending discovered links to the result file
//! - Streaming timestamped log lines to the front end
//! - The terminal crawl summary

mod events;
mod sink;

pub use events::{CrawlEvent, CrawlSummary, LinkTally, LogLine, Reporter, Severity};
pub use sink::{FileSink, OutputError, OutputResult, ResultSink};

/// Builds the terminal summary from what a crawl collected
///
/// # Arguments
///
/// * `reason` - Why the crawl ended
/// * `pages_visited` - Pages fully processed
/// * `total_links` - Unique links collected
/// * `output_path` - Where the links were written
pub fn summarize(
    reason: crate::state::FinishReason,
    pages_visited: u32,
    total_links: usize,
    output_path: &std::path::Path,
) -> CrawlSummary {
    let tally = if total_links > 0 {
        LinkTally::Found {
            total: total_links,
            output_path: output_path.to_path_buf(),
        }
    } else {
        LinkTally::NoneFound
    };

    CrawlSummary {
        reason,
        pages_visited,
        tally,
    }
}
