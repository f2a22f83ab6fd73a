//! Static HTTP renderer
//!
//! Fetches each page with a single GET and answers locator queries against the
//! returned HTML. Scripts never run, so waits resolve immediately.

use crate::render::{
    dom, ElementHandle, LaunchOptions, Locator, RenderError, RenderResult, Renderer,
};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// The page currently held by the renderer
///
/// The source is parsed once per navigation; every locator query runs
/// against the same document.
#[derive(Debug)]
struct LoadedPage {
    url: Url,
    source: String,
    document: Mutex<Html>,
}

impl LoadedPage {
    fn new(url: Url, source: String) -> Self {
        let document = Mutex::new(Html::parse_document(&source));
        Self {
            url,
            source,
            document,
        }
    }

    fn select(&self, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
        let document = self
            .document
            .lock()
            .map_err(|_| RenderError::Session("page document lock poisoned".to_string()))?;
        dom::select_in(&document, locator)
    }
}

/// Renderer backed by a reqwest client
#[derive(Debug)]
pub struct HttpRenderer {
    client: Client,
    page: Option<LoadedPage>,
}

impl HttpRenderer {
    /// Creates a renderer with a client built from `options`
    pub fn new(options: &LaunchOptions) -> RenderResult<Self> {
        let client = build_http_client(options)
            .map_err(|e| RenderError::Launch(format!("HTTP client: {}", e)))?;

        Ok(Self { client, page: None })
    }

    fn loaded(&self) -> RenderResult<&LoadedPage> {
        self.page.as_ref().ok_or(RenderError::NoPage)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `options` - Launch settings; the user agent and page load timeout apply
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(options: &LaunchOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.page_load_timeout)
        .connect_timeout(options.page_load_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        let navigation_error = |reason: String| RenderError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let source = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        tracing::debug!("Loaded {} ({} bytes)", final_url, source.len());

        self.page = Some(LoadedPage::new(final_url, source));
        Ok(())
    }

    async fn page_source(&self) -> RenderResult<String> {
        Ok(self.loaded()?.source.clone())
    }

    async fn current_url(&self) -> RenderResult<String> {
        Ok(self.loaded()?.url.to_string())
    }

    async fn query_elements(&self, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
        self.loaded()?.select(locator)
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.page = None;
        Ok(())
    }
}
