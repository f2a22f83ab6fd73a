//! In-memory site and renderer for driving the crawl loop in tests

use crate::render::{
    dom, ElementHandle, LaunchOptions, Launcher, Locator, RenderError, RenderResult, Renderer,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type NavigateHook = Arc<dyn Fn(usize) + Send + Sync>;

/// A fixed set of pages keyed by URL, plus a record of what was visited
#[derive(Clone, Default)]
pub(crate) struct FixtureSite {
    pages: HashMap<String, String>,
    broken_sources: Vec<String>,
    visits: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    on_navigate: Option<NavigateHook>,
    fail_launch: bool,
}

impl FixtureSite {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Navigation to `url` succeeds but reading its source fails
    pub(crate) fn broken_source(mut self, url: &str) -> Self {
        self.broken_sources.push(url.to_string());
        self
    }

    /// Calls `hook` with the 1-based navigation count after each navigation
    pub(crate) fn on_navigate(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_navigate = Some(Arc::new(hook));
        self
    }

    pub(crate) fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn renderer(&self) -> FixtureRenderer {
        FixtureRenderer {
            site: self.clone(),
            current: None,
        }
    }

    pub(crate) fn launcher(&self) -> FixtureLauncher {
        FixtureLauncher { site: self.clone() }
    }
}

pub(crate) struct FixtureRenderer {
    site: FixtureSite,
    current: Option<String>,
}

impl FixtureRenderer {
    fn current(&self) -> RenderResult<&str> {
        self.current.as_deref().ok_or(RenderError::NoPage)
    }

    fn source(&self) -> RenderResult<&str> {
        let url = self.current()?;
        if self.site.broken_sources.iter().any(|u| u == url) {
            return Err(RenderError::Session("page source unavailable".to_string()));
        }
        self.site
            .pages
            .get(url)
            .map(String::as_str)
            .ok_or(RenderError::NoPage)
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        if !self.site.pages.contains_key(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }

        let count = {
            let mut visits = self.site.visits.lock().unwrap();
            visits.push(url.to_string());
            visits.len()
        };
        self.current = Some(url.to_string());

        if let Some(hook) = &self.site.on_navigate {
            hook(count);
        }
        Ok(())
    }

    async fn page_source(&self) -> RenderResult<String> {
        self.source().map(str::to_string)
    }

    async fn current_url(&self) -> RenderResult<String> {
        self.current().map(str::to_string)
    }

    async fn query_elements(&self, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
        match self.site.pages.get(self.current()?) {
            Some(html) => dom::select(html, locator),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.site.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FixtureLauncher {
    site: FixtureSite,
}

#[async_trait]
impl Launcher for FixtureLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> RenderResult<Box<dyn Renderer>> {
        if self.site.fail_launch {
            return Err(RenderError::Launch("no browser binary found".to_string()));
        }
        Ok(Box::new(self.site.renderer()))
    }
}
