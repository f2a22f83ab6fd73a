//! Media link extraction from a rendered page
//!
//! Two independent passes feed one candidate pool:
//! - a regex sweep over the raw page source, four shapes per extension
//! - DOM queries for media-bearing attributes
//!
//! Candidates are then filtered to those naming a requested extension and
//! normalized against the page's host. Every probe is best-effort: a failing
//! query or lookup is a miss, never an error.

use crate::config::TimingConfig;
use crate::crawler::StopSignal;
use crate::render::{Locator, RenderResult, Renderer};
use crate::url::{normalize_link, page_host, parse_page_url};
use regex::Regex;
use std::collections::HashSet;

/// Attributes whose values may carry a media URL
pub const MEDIA_ATTRIBUTES: [&str; 5] = ["href", "src", "data-src", "data-url", "data-video"];

/// Elements that signal the page content has rendered
const CONTENT_SELECTOR: &str = "video, img, a, [class*='post']";

/// A page source this large counts as rendered even without those elements
const SUBSTANTIAL_SOURCE_BYTES: usize = 10_000;

/// Links mined from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub links: HashSet<String>,

    /// False when the page body or content did not show up within the waits
    pub content_ready: bool,
}

/// Finds media links for a fixed set of extensions
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    /// Lowercase, without leading dot
    extensions: Vec<String>,
    patterns: Vec<Regex>,
    locators: Vec<Locator>,
    timing: TimingConfig,
}

impl LinkExtractor {
    /// Compiles the regex shapes and DOM locators for `extensions`
    ///
    /// # Arguments
    ///
    /// * `extensions` - Target extensions, lowercase and without a leading dot
    /// * `timing` - Waits applied before mining each page
    pub fn new(extensions: &[String], timing: TimingConfig) -> Result<Self, regex::Error> {
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

        let mut patterns = Vec::with_capacity(extensions.len() * 4);
        for ext in &extensions {
            patterns.extend(source_patterns(ext)?);
        }

        let mut locators: Vec<Locator> = extensions
            .iter()
            .flat_map(|ext| {
                MEDIA_ATTRIBUTES
                    .iter()
                    .map(move |attr| Locator::Css(format!("[{}*='.{}']", attr, ext)))
            })
            .collect();
        locators.push(Locator::css("video[src]"));
        locators.push(Locator::css("source[src]"));

        Ok(Self {
            extensions,
            patterns,
            locators,
            timing,
        })
    }

    /// Mines the renderer's current page
    ///
    /// The stop signal is sampled before and between the content waits and
    /// before mining; once it is set the result is empty.
    ///
    /// # Returns
    ///
    /// * `Ok(Extraction)` - Normalized, deduplicated links
    /// * `Err(RenderError)` - The page source could not be read at all
    pub async fn extract(
        &self,
        renderer: &dyn Renderer,
        stop: &StopSignal,
    ) -> RenderResult<Extraction> {
        if stop.is_set() {
            return Ok(Extraction::default());
        }

        let mut content_ready = self.wait_for_body(renderer).await;

        if stop.is_set() {
            return Ok(Extraction::default());
        }

        let content = Locator::css(CONTENT_SELECTOR);
        let content_shown = self.wait_for_content(renderer, &content).await;

        if stop.is_set() {
            return Ok(Extraction::default());
        }

        let source = renderer.page_source().await?;
        content_ready &= content_shown || source.len() > SUBSTANTIAL_SOURCE_BYTES;
        let host = match renderer.current_url().await {
            Ok(current) => match parse_page_url(&current) {
                Ok(url) => page_host(&url),
                Err(e) => {
                    tracing::debug!("Root-relative links kept as-is, page at {}: {}", current, e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("Current URL unavailable, root-relative links kept as-is: {}", e);
                None
            }
        };

        let mut candidates = self.mine_source(&source);
        candidates.extend(self.mine_dom(renderer).await);

        Ok(Extraction {
            links: self.finalize(candidates, host.as_deref()),
            content_ready,
        })
    }

    /// Runs every regex shape over `source`
    pub fn mine_source(&self, source: &str) -> HashSet<String> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.find_iter(source))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Collects media attribute values from matching elements
    async fn mine_dom(&self, renderer: &dyn Renderer) -> Vec<String> {
        let mut values = Vec::new();

        for locator in &self.locators {
            match renderer.query_elements(locator).await {
                Ok(elements) => {
                    for element in &elements {
                        values.extend(
                            MEDIA_ATTRIBUTES
                                .iter()
                                .filter_map(|attr| element.attr(attr))
                                .map(str::to_string),
                        );
                    }
                }
                Err(e) => tracing::debug!("DOM probe {} failed: {}", locator, e),
            }
        }

        values
    }

    /// Trims, filters to requested extensions and normalizes
    pub fn finalize<I>(&self, candidates: I, host: Option<&str>) -> HashSet<String>
    where
        I: IntoIterator<Item = String>,
    {
        candidates
            .into_iter()
            .map(|candidate| candidate.trim().to_string())
            .filter(|candidate| !candidate.is_empty() && self.names_extension(candidate))
            .map(|candidate| normalize_link(&candidate, host))
            .collect()
    }

    /// Whether `candidate` contains `.<ext>` for a requested extension, ignoring case
    pub fn names_extension(&self, candidate: &str) -> bool {
        let lower = candidate.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.contains(&format!(".{}", ext)))
    }

    async fn wait_for_body(&self, renderer: &dyn Renderer) -> bool {
        let wait = self.timing.body_wait();
        match renderer.wait_for_element(&Locator::css("body"), wait).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!("No body within {:?}", wait);
                false
            }
            Err(e) => {
                tracing::debug!("Waiting for body failed: {}", e);
                false
            }
        }
    }

    async fn wait_for_content(&self, renderer: &dyn Renderer, locator: &Locator) -> bool {
        match renderer
            .wait_for_element(locator, self.timing.content_wait())
            .await
        {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::debug!("Waiting for content failed: {}", e);
                false
            }
        }
    }
}

/// The four source shapes for one extension, most specific first
///
/// The shapes overlap; a link found by the absolute shape is usually found
/// again by the looser ones. Duplicates collapse in the candidate set.
fn source_patterns(ext: &str) -> Result<Vec<Regex>, regex::Error> {
    let ext = regex::escape(ext);
    [
        format!(r#"(?i)https?://[^\s"'<>]*\.{ext}[^\s"'<>]*"#),
        format!(r#"(?i)//[^\s"'<>]*\.{ext}[^\s"'<>]*"#),
        format!(r#"(?i)/[^\s"'<>]*\.{ext}[^\s"'<>]*"#),
        format!(r#"(?i)[^\s"'<>]*\.{ext}[^\s"'<>]*"#),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern))
    .collect()
}
