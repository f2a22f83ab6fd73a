//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Where the crawl is in its lifecycle (idle, running, stopping, finished)
//! - `FinishReason`: Why a finished crawl ended, and whether that counts as success
//! - `CrawlState`: Current URL, page counter and seen-set owned by the crawl worker

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::CrawlState;
pub use phase::{CrawlPhase, FinishReason};
