//! Renderer abstraction over a controllable page session
//!
//! The crawl loop only ever talks to a [`Renderer`]: navigate, read the page
//! source, ask for elements by [`Locator`] with a bounded wait, and close.
//! Elements come back as [`ElementHandle`] attribute snapshots so nothing
//! borrowed from the session outlives a call.
//!
//! # Backends
//!
//! - [`HttpRenderer`]: fetches pages with reqwest and queries a static DOM
//! - `ChromeRenderer` (feature `chrome`): drives Chrome/Chromium over DevTools

mod dom;
mod http;

#[cfg(feature = "chrome")]
mod chrome;

#[cfg(test)]
pub(crate) mod fixture;

use crate::config::{Config, RendererKind};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use dom::{select, select_in};
pub use http::HttpRenderer;

#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;

/// Browser window size requested from windowed backends
pub const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Errors raised by a renderer session
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("No page has been loaded")]
    NoPage,

    #[error("Renderer session failed: {0}")]
    Session(String),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// How to find elements on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A CSS selector
    Css(String),

    /// An `<a>` whose visible text equals the pattern, ignoring case
    LinkText(String),

    /// The nearest `<a>` enclosing (or being) an element whose own text
    /// contains the pattern, ignoring case
    TextInAnchor(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css({})", selector),
            Self::LinkText(text) => write!(f, "link-text({})", text),
            Self::TextInAnchor(text) => write!(f, "text-in-anchor({})", text),
        }
    }
}

/// Snapshot of an element's tag and attributes at query time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementHandle {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementHandle {
    /// Value of attribute `name`, compared ASCII case-insensitively
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_anchor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }
}

/// A controllable page session
///
/// Implementations are used by one crawl worker at a time; `Sync` is needed
/// only so borrowed calls can be awaited on a multi-threaded runtime.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Loads `url`, returning once the page load completed or failed
    async fn navigate(&mut self, url: &str) -> RenderResult<()>;

    /// Serialized DOM of the current page
    async fn page_source(&self) -> RenderResult<String>;

    /// URL of the current page, after redirects
    async fn current_url(&self) -> RenderResult<String>;

    /// All elements matching `locator`, in document order
    async fn query_elements(&self, locator: &Locator) -> RenderResult<Vec<ElementHandle>>;

    /// First element matching `locator`, waiting up to `timeout` for it
    ///
    /// Returns `Ok(None)` when nothing matched in time. Backends whose DOM
    /// cannot change after load answer with a single query.
    async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> RenderResult<Option<ElementHandle>> {
        let _ = timeout;
        Ok(self.query_elements(locator).await?.into_iter().next())
    }

    /// Ends the session and releases its resources
    async fn close(&mut self) -> RenderResult<()>;
}

/// Settings a renderer session is launched with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub kind: RendererKind,
    pub headless: bool,
    pub page_load_timeout: Duration,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub browser_path: Option<PathBuf>,
}

impl LaunchOptions {
    /// Derives launch settings from a crawl configuration
    ///
    /// The session is visible when either the visible-browser or the
    /// manual-intervention option is set.
    pub fn from_config(config: &Config) -> Self {
        Self {
            kind: config.renderer.kind,
            headless: config.headless(),
            page_load_timeout: config.renderer.page_load_timeout(),
            user_agent: config.renderer.user_agent.clone(),
            window_size: WINDOW_SIZE,
            browser_path: config.renderer.browser_path.clone(),
        }
    }
}

/// Creates renderer sessions
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> RenderResult<Box<dyn Renderer>>;
}

/// Launches the backend named by [`LaunchOptions::kind`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLauncher;

#[async_trait]
impl Launcher for DefaultLauncher {
    async fn launch(&self, options: &LaunchOptions) -> RenderResult<Box<dyn Renderer>> {
        tracing::debug!(
            "Launching {} renderer (headless: {})",
            options.kind,
            options.headless
        );

        match options.kind {
            RendererKind::Http => {
                if !options.headless {
                    tracing::debug!("HTTP renderer has no window to show");
                }
                Ok(Box::new(HttpRenderer::new(options)?))
            }
            RendererKind::Chrome => launch_chrome(options).await,
        }
    }
}

#[cfg(feature = "chrome")]
async fn launch_chrome(options: &LaunchOptions) -> RenderResult<Box<dyn Renderer>> {
    Ok(Box::new(ChromeRenderer::launch(options).await?))
}

#[cfg(not(feature = "chrome"))]
async fn launch_chrome(_options: &LaunchOptions) -> RenderResult<Box<dyn Renderer>> {
    Err(RenderError::Launch(
        "this build has no Chrome support (enable the `chrome` feature)".to_string(),
    ))
}
