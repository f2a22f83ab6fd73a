//! Next-page discovery
//!
//! Each next-page pattern is tried in order against five probe shapes. The
//! first probe that resolves to an anchor with a usable `href` wins, so the
//! pattern list doubles as a priority list.

use crate::crawler::StopSignal;
use crate::render::{Locator, Renderer};
use crate::url::{parse_page_url, resolve_href};
use std::time::Duration;
use url::Url;

/// Locates the link to the next page of results
#[derive(Debug, Clone)]
pub struct PaginationLocator {
    patterns: Vec<String>,
    probe_timeout: Duration,
}

impl PaginationLocator {
    pub fn new(patterns: &[String], probe_timeout: Duration) -> Self {
        Self {
            patterns: patterns.to_vec(),
            probe_timeout,
        }
    }

    /// Finds the next page URL, absolute and resolved against the current page
    ///
    /// Returns None when every probe missed or the stop signal was observed.
    /// Probe failures count as misses.
    pub async fn find_next(&self, renderer: &dyn Renderer, stop: &StopSignal) -> Option<String> {
        if stop.is_set() {
            return None;
        }

        let base = match renderer.current_url().await {
            Ok(current) => match parse_page_url(&current) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Pagination base {} rejected: {}", current, e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("Current URL unavailable for pagination: {}", e);
                None
            }
        };

        for pattern in &self.patterns {
            for probe in probes(pattern) {
                if stop.is_set() {
                    return None;
                }

                let element = match renderer.wait_for_element(&probe, self.probe_timeout).await {
                    Ok(Some(element)) => element,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::trace!("Probe {} failed: {}", probe, e);
                        continue;
                    }
                };

                let Some(href) = element.attr("href") else {
                    continue;
                };

                if let Some(next) = resolve(href, base.as_ref()) {
                    tracing::debug!("Next page via {}: {}", probe, next);
                    return Some(next);
                }
            }
        }

        None
    }
}

/// The five probe shapes for one pattern, in priority order
pub fn probes(pattern: &str) -> [Locator; 5] {
    let quoted = escape_css_string(pattern);
    [
        Locator::Css(format!("a[class*='{}']", quoted)),
        Locator::Css(format!("a[rel='{}']", quoted)),
        Locator::Css(format!("a[title*='{}']", quoted)),
        Locator::LinkText(pattern.to_string()),
        Locator::TextInAnchor(pattern.to_string()),
    ]
}

fn resolve(href: &str, base: Option<&Url>) -> Option<String> {
    match base {
        Some(base) => resolve_href(href, base),
        None => Url::parse(href.trim())
            .ok()
            .filter(|url| url.scheme() == "http" || url.scheme() == "https")
            .map(|url| url.to_string()),
    }
}

/// Escapes `value` for use inside a single-quoted CSS string
fn escape_css_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
