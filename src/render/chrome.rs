//! Chrome/Chromium renderer over the DevTools protocol
//!
//! headless_chrome is a blocking client, so every session call is moved onto
//! tokio's blocking pool. Text locators are compiled to XPath.

use crate::render::{ElementHandle, LaunchOptions, Locator, RenderError, RenderResult, Renderer};
use async_trait::async_trait;
use headless_chrome::{Browser, Element, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

const IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// A live browser with a single tab
pub struct ChromeRenderer {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeRenderer {
    /// Starts a browser process and opens the tab the crawl will drive
    pub async fn launch(options: &LaunchOptions) -> RenderResult<Self> {
        let options = options.clone();

        let (browser, tab) = tokio::task::spawn_blocking(move || {
            let launch = headless_chrome::LaunchOptions {
                headless: options.headless,
                sandbox: false,
                window_size: Some(options.window_size),
                path: options.browser_path.clone(),
                args: vec![
                    OsStr::new("--no-sandbox"),
                    OsStr::new("--disable-gpu"),
                    OsStr::new("--disable-dev-shm-usage"),
                ],
                // Manual confirmation can leave the browser idle for a long time
                idle_browser_timeout: IDLE_TIMEOUT,
                ..Default::default()
            };

            let browser = Browser::new(launch).map_err(|e| RenderError::Launch(e.to_string()))?;
            let tab = browser
                .new_tab()
                .map_err(|e| RenderError::Launch(e.to_string()))?;
            tab.set_default_timeout(options.page_load_timeout);
            tab.set_user_agent(&options.user_agent, None, None)
                .map_err(|e| RenderError::Launch(e.to_string()))?;

            Ok::<_, RenderError>((browser, tab))
        })
        .await
        .map_err(|e| RenderError::Launch(e.to_string()))??;

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    /// Runs `f` against the tab on the blocking pool
    async fn with_tab<T, F>(&self, f: F) -> RenderResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> RenderResult<T> + Send + 'static,
    {
        if self.browser.is_none() {
            return Err(RenderError::Session("browser already closed".to_string()));
        }

        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(tab.as_ref()))
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        let target = url.to_string();
        self.with_tab(move |tab| {
            tab.navigate_to(&target)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| RenderError::Navigation {
                    url: target.clone(),
                    reason: e.to_string(),
                })
        })
        .await
    }

    async fn page_source(&self) -> RenderResult<String> {
        self.with_tab(|tab| {
            tab.get_content()
                .map_err(|e| RenderError::Session(e.to_string()))
        })
        .await
    }

    async fn current_url(&self) -> RenderResult<String> {
        self.with_tab(|tab| Ok(tab.get_url())).await
    }

    async fn query_elements(&self, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
        let locator = locator.clone();
        self.with_tab(move |tab| {
            let found = match &locator {
                Locator::Css(css) => tab.find_elements(css),
                other => tab.find_elements_by_xpath(&to_xpath(other)),
            };

            // An empty result surfaces as an error from the protocol
            match found {
                Ok(elements) => Ok(elements.iter().map(snapshot).collect()),
                Err(e) => {
                    tracing::trace!("No elements for {}: {}", locator, e);
                    Ok(Vec::new())
                }
            }
        })
        .await
    }

    async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> RenderResult<Option<ElementHandle>> {
        let locator = locator.clone();
        self.with_tab(move |tab| {
            let found = match &locator {
                Locator::Css(css) => tab.wait_for_element_with_custom_timeout(css, timeout),
                other => tab.wait_for_xpath_with_custom_timeout(&to_xpath(other), timeout),
            };

            match found {
                Ok(element) => Ok(Some(snapshot(&element))),
                Err(e) => {
                    tracing::trace!("Gave up waiting for {}: {}", locator, e);
                    Ok(None)
                }
            }
        })
        .await
    }

    async fn close(&mut self) -> RenderResult<()> {
        if let Some(browser) = self.browser.take() {
            let tab = Arc::clone(&self.tab);
            tokio::task::spawn_blocking(move || {
                if let Err(e) = tab.close(false) {
                    tracing::debug!("Tab close failed: {}", e);
                }
                drop(browser);
            })
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;
        }
        Ok(())
    }
}

fn snapshot(element: &Element<'_>) -> ElementHandle {
    let attrs = element
        .attributes
        .as_ref()
        .map(|flat| {
            flat.chunks(2)
                .filter_map(|pair| match pair {
                    [name, value] => Some((name.clone(), value.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    ElementHandle {
        tag: element.tag_name.to_lowercase(),
        attrs,
    }
}

/// Compiles a text locator to an XPath expression
///
/// XPath 1.0 has no lower-case(), so both sides are folded with translate().
/// Only ASCII letters are folded.
fn to_xpath(locator: &Locator) -> String {
    match locator {
        Locator::Css(css) => css.clone(),
        Locator::LinkText(text) => format!(
            "//a[translate(normalize-space(.), '{}', '{}') = {}]",
            UPPER,
            LOWER,
            xpath_literal(&text.trim().to_lowercase())
        ),
        Locator::TextInAnchor(text) => format!(
            "//*[text()[contains(translate(., '{}', '{}'), {})]]/ancestor-or-self::a",
            UPPER,
            LOWER,
            xpath_literal(&text.to_lowercase())
        ),
    }
}

/// Quotes `value` as an XPath string literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
