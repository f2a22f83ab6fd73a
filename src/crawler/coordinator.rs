//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Launching and closing the renderer
//! - The optional manual-intervention gate before the first page
//! - Navigating, mining and paginating page by page
//! - Deduplicating links and appending new ones to the result sink
//! - Honoring the cooperative stop signal at every checkpoint

use crate::config::Config;
use crate::crawler::{
    CrawlReport, GateDecision, LinkExtractor, PaginationLocator, StopSignal,
};
use crate::output::{summarize, FileSink, Reporter, ResultSink};
use crate::render::{LaunchOptions, Launcher, Renderer};
use crate::state::{CrawlPhase, CrawlState, FinishReason};
use crate::SweepError;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::oneshot;

/// How many links of a batch are echoed to the log
const PREVIEW_LINKS: usize = 5;

/// How many consecutive empty pages are reported before going quiet
const QUIET_AFTER_EMPTY_PAGES: u32 = 5;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    renderer: Box<dyn Renderer>,
    extractor: LinkExtractor,
    paginator: PaginationLocator,
    sink: Box<dyn ResultSink>,
    state: CrawlState,
    reporter: Reporter,
    stop: StopSignal,
    gate: Option<oneshot::Receiver<GateDecision>>,
}

impl Coordinator {
    /// Creates a new coordinator around an already launched renderer
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `renderer` - The session pages are loaded in
    /// * `sink` - Where newly found links are appended
    /// * `reporter` - Outbound event stream
    /// * `stop` - Cooperative stop signal
    /// * `gate` - Manual-intervention gate, awaited before the first page
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError)` - The extension patterns failed to compile
    pub fn new(
        config: Config,
        renderer: Box<dyn Renderer>,
        sink: Box<dyn ResultSink>,
        reporter: Reporter,
        stop: StopSignal,
        gate: Option<oneshot::Receiver<GateDecision>>,
    ) -> Result<Self, SweepError> {
        let extractor = LinkExtractor::new(&config.extensions, config.timing.clone())?;
        let paginator = PaginationLocator::new(&config.next_patterns, config.timing.probe_timeout());
        let state = CrawlState::new(config.start_url.clone());

        Ok(Self {
            config,
            renderer,
            extractor,
            paginator,
            sink,
            state,
            reporter,
            stop,
            gate,
        })
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the crawl to completion and closes the renderer
    pub async fn run(&mut self) -> FinishReason {
        self.transition(CrawlPhase::Running);

        let reason = self.crawl_pages().await;

        if reason.is_user_initiated() {
            self.transition(CrawlPhase::Stopping);
        }
        self.transition(CrawlPhase::Finished(reason));

        if let Err(e) = self.renderer.close().await {
            tracing::warn!("Renderer did not close cleanly: {}", e);
        }
        self.reporter.info("Browser closed");

        reason
    }

    /// Consumes the coordinator into the final report
    pub fn into_report(self, reason: FinishReason) -> CrawlReport {
        CrawlReport {
            reason,
            pages_visited: self.state.pages_visited,
            links: self.state.sorted_links(),
            output_path: self.sink.location().to_path_buf(),
        }
    }

    async fn crawl_pages(&mut self) -> FinishReason {
        let mut page_loaded = false;

        if let Some(gate) = self.gate.take() {
            if let Err(reason) = self.pass_manual_gate(gate).await {
                return reason;
            }
            page_loaded = true;
        }

        loop {
            let Some(url) = self.state.current_url.clone() else {
                return FinishReason::NoMorePages;
            };
            let page = self.state.pages_visited + 1;

            if self.stop.is_set() {
                return FinishReason::Stopped;
            }

            self.reporter.info(format!("Processing page {}: {}", page, url));

            if !page_loaded {
                if let Err(e) = self.renderer.navigate(&url).await {
                    self.reporter.error(format!("Error on page {}: {}", page, e));
                    return FinishReason::PageError;
                }
            }
            page_loaded = false;

            if self.stop.is_set() {
                return FinishReason::Stopped;
            }

            let extraction = match self.extractor.extract(self.renderer.as_ref(), &self.stop).await {
                Ok(extraction) => extraction,
                Err(e) => {
                    self.reporter.error(format!("Error on page {}: {}", page, e));
                    return FinishReason::PageError;
                }
            };

            if !extraction.content_ready {
                self.reporter
                    .warn(format!("Content loading timeout on page {}", page));
            }

            if self.stop.is_set() {
                return FinishReason::Stopped;
            }

            self.record_page(page, extraction.links);
            self.state.pages_visited += 1;

            if let Some(limit) = self.config.page_limit() {
                if self.state.pages_visited >= limit {
                    self.reporter
                        .info(format!("Reached maximum pages limit ({})", limit));
                    return FinishReason::PageLimit;
                }
            }

            match self
                .paginator
                .find_next(self.renderer.as_ref(), &self.stop)
                .await
            {
                Some(next) => {
                    tracing::debug!("Next page: {}", next);
                    self.state.current_url = Some(next);
                }
                None if self.stop.is_set() => return FinishReason::Stopped,
                None => {
                    self.reporter.info("No more pages found");
                    self.state.current_url = None;
                    return FinishReason::NoMorePages;
                }
            }

            if !self.pause(self.next_page_delay()).await {
                return FinishReason::Stopped;
            }
        }
    }

    /// Loads the start page and blocks until a human answers the gate
    async fn pass_manual_gate(
        &mut self,
        gate: oneshot::Receiver<GateDecision>,
    ) -> Result<(), FinishReason> {
        if self.stop.is_set() {
            return Err(FinishReason::Stopped);
        }

        self.reporter
            .info("Manual mode: opening the start page for manual intervention...");

        if let Err(e) = self.renderer.navigate(&self.config.start_url).await {
            self.reporter.error(format!("Error on page 1: {}", e));
            return Err(FinishReason::PageError);
        }

        self.reporter
            .info("Solve any CAPTCHA or verification in the browser, then confirm to continue");
        self.reporter.awaiting_confirmation();

        tokio::select! {
            decision = gate => match decision {
                Ok(GateDecision::Continue) => {
                    self.reporter.info("Manual step confirmed, continuing");
                    Ok(())
                }
                Ok(GateDecision::Cancel) | Err(_) => {
                    self.reporter.info("Manual step cancelled by user");
                    Err(FinishReason::Cancelled)
                }
            },
            _ = self.stop.stopped() => Err(FinishReason::Stopped),
        }
    }

    /// Diffs a page's links against the seen-set and persists the new ones
    fn record_page(&mut self, page: u32, links: HashSet<String>) {
        if links.is_empty() {
            self.state.pages_without_media += 1;
            if self.state.pages_without_media <= QUIET_AFTER_EMPTY_PAGES {
                self.reporter
                    .info(format!("Page {}: No media files found", page));
            }
            return;
        }
        self.state.pages_without_media = 0;

        let fresh = self.state.record_links(links);
        if fresh.is_empty() {
            self.reporter
                .info(format!("Page {}: No new files (all duplicates)", page));
            return;
        }

        self.reporter.info(format!(
            "Page {}: FOUND {} new files! (Total: {})",
            page,
            fresh.len(),
            self.state.total_links()
        ));
        for link in fresh.iter().take(PREVIEW_LINKS) {
            self.reporter.info(format!("  {}", link));
        }
        if fresh.len() > PREVIEW_LINKS {
            self.reporter
                .info(format!("  ... and {} more", fresh.len() - PREVIEW_LINKS));
        }

        match self.sink.append(&fresh) {
            Ok(()) => self.reporter.info(format!(
                "Appended {} links to {}",
                fresh.len(),
                self.sink.location().display()
            )),
            Err(e) => self
                .reporter
                .error(format!("Failed to save links to file: {}", e)),
        }
    }

    /// Pause before loading the next page, shorter after a page without media
    fn next_page_delay(&self) -> Duration {
        self.config
            .timing
            .page_delay(self.state.pages_without_media == 0)
    }

    /// Sleeps for `delay`; returns false if the stop signal cut it short
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.stop.is_set();
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.stop.stopped() => false,
        }
    }

    fn transition(&mut self, to: CrawlPhase) {
        match self.state.advance(to) {
            Ok(()) => tracing::debug!("Crawl is {}", self.state.phase()),
            Err(e) => tracing::error!("{}", e),
        }
    }
}

/// Runs one complete crawl
///
/// Launches the renderer described by `config`, drives the crawl loop, closes
/// the renderer, reports a summary and always ends the event stream with
/// exactly one `Finished` event.
///
/// # Arguments
///
/// * `config` - A validated crawl configuration
/// * `launcher` - Creates the renderer session
/// * `reporter` - Outbound event stream
/// * `stop` - Cooperative stop signal
/// * `gate` - Manual-intervention gate, when enabled
pub async fn run_crawl(
    config: Config,
    launcher: &dyn Launcher,
    reporter: Reporter,
    stop: StopSignal,
    gate: Option<oneshot::Receiver<GateDecision>>,
) -> CrawlReport {
    let sink: Box<dyn ResultSink> = Box::new(FileSink::new(config.output_path.clone()));

    reporter.info("Starting media sweep");
    reporter.info(format!("Target URL: {}", config.start_url));
    reporter.info(format!("Output file: {}", config.output_path.display()));
    reporter.info(format!("File types: {}", config.extensions.join(", ")));
    reporter.info(format!("Next patterns: {}", config.next_patterns.join(", ")));

    let options = LaunchOptions::from_config(&config);
    let setup = match launcher.launch(&options).await {
        Ok(renderer) => Coordinator::new(
            config.clone(),
            renderer,
            sink,
            reporter.clone(),
            stop,
            gate,
        ),
        Err(e) => Err(e.into()),
    };

    let mut coordinator = match setup {
        Ok(coordinator) => coordinator,
        Err(e) => {
            reporter.error(format!("Failed to set up renderer: {}", e));
            let reason = FinishReason::SetupError;
            reporter.finish(summarize(reason, 0, 0, &config.output_path));
            return CrawlReport {
                reason,
                pages_visited: 0,
                links: Vec::new(),
                output_path: config.output_path,
            };
        }
    };

    let reason = coordinator.run().await;
    let pages_visited = coordinator.state().pages_visited;
    let total = coordinator.state().total_links();

    if total > 0 {
        reporter.info(format!("SUCCESS! Found {} media links total", total));
        reporter.info(format!("Saved to: {}", config.output_path.display()));
    } else {
        reporter.warn("No media links found");
    }
    reporter.info(format!("Crawl finished: {}", reason.status_line()));

    let report = coordinator.into_report(reason);
    reporter.finish(summarize(reason, pages_visited, total, &report.output_path));

    report
}
