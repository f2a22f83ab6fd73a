//! Crawler module for paginated media harvesting
//!
//! This module contains the core crawling logic, including:
//! - Media link extraction from rendered pages
//! - Next-page discovery
//! - Cooperative stop and the manual-intervention gate
//! - Overall crawl coordination

mod control;
mod coordinator;
mod extractor;
mod paginator;

pub use control::{
    Controller, CrawlHandle, CrawlReport, GateDecision, ManualGate, StopSignal,
};
pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{Extraction, LinkExtractor, MEDIA_ATTRIBUTES};
pub use paginator::{probes, PaginationLocator};

use crate::config::Config;
use crate::ConfigError;

/// Runs a complete crawl and waits for it to finish
///
/// This is the simplest entry point for embedding. It will:
/// 1. Validate the configuration
/// 2. Launch the configured renderer
/// 3. Follow next-page links from the start URL
/// 4. Append new media links to the output file
///
/// Status events are discarded; use [`Controller`] to observe them or to stop
/// the crawl early. A config asking for manual intervention is rejected, as
/// nothing here could answer the gate.
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; check [`CrawlReport::is_success`]
/// * `Err(SweepError)` - The crawl could not be started
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    if config.manual_intervention {
        return Err(ConfigError::Validation(
            "manual intervention needs a front end; start the crawl through a Controller"
                .to_string(),
        )
        .into());
    }
    Controller::new().start(config)?.wait().await
}
