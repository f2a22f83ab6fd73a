use crate::config::parser::{parse_extensions, parse_list};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// File extensions hunted for when none are given
pub const DEFAULT_EXTENSIONS: &str = "mp4,webm,avi,mov";

/// Pagination link texts tried when none are given
pub const DEFAULT_NEXT_PATTERNS: &str = "next,>>,→,continue,more";

/// Output file used when none is given
pub const DEFAULT_OUTPUT_PATH: &str = "scraped_links.txt";

/// User agent presented by the renderer
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Main configuration structure for a crawl
///
/// Once a crawl starts its configuration is frozen; the worker owns its own copy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// First page of the paginated listing
    #[serde(default)]
    pub start_url: String,

    /// Lowercase file extensions without the leading dot
    #[serde(default = "default_extensions", deserialize_with = "extension_list")]
    pub extensions: Vec<String>,

    /// Lowercase link texts that identify the next page, in priority order
    #[serde(default = "default_next_patterns", deserialize_with = "pattern_list")]
    pub next_patterns: Vec<String>,

    /// Text file new links are appended to
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Show the browser window instead of running headless
    #[serde(default)]
    pub visible_browser: bool,

    /// Pause after the first page loads until a human confirms (e.g. after solving a CAPTCHA)
    #[serde(default)]
    pub manual_intervention: bool,

    /// Page ceiling; `None` or 0 means unlimited
    #[serde(default)]
    pub max_pages: Option<u32>,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

impl Config {
    /// Creates a configuration for `start_url` with every other setting at its default
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            extensions: default_extensions(),
            next_patterns: default_next_patterns(),
            output_path: default_output_path(),
            visible_browser: false,
            manual_intervention: false,
            max_pages: None,
            renderer: RendererConfig::default(),
            timing: TimingConfig::default(),
        }
    }

    /// Replaces the extension set from a comma-separated list such as `"mp4, .WEBM"`
    pub fn with_extensions(mut self, raw: &str) -> Self {
        self.extensions = parse_extensions(raw);
        self
    }

    /// Replaces the next-page patterns from a comma-separated list
    pub fn with_next_patterns(mut self, raw: &str) -> Self {
        self.next_patterns = parse_list(raw);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// The effective page ceiling, with 0 folded into "unlimited"
    pub fn page_limit(&self) -> Option<u32> {
        self.max_pages.filter(|&n| n > 0)
    }

    /// The browser runs headless unless a visible window or a manual step was requested
    pub fn headless(&self) -> bool {
        !(self.visible_browser || self.manual_intervention)
    }

    /// Validates this configuration
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        crate::config::validation::validate(self)
    }
}

/// Renderer selection and launch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// Upper bound for a single page load (milliseconds)
    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Explicit browser binary; auto-detected when absent
    #[serde(default)]
    pub browser_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::default(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            user_agent: default_user_agent(),
            browser_path: None,
        }
    }
}

impl RendererConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }
}

/// Which renderer backs the crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP fetch with a static DOM
    #[default]
    Http,
    /// Chrome/Chromium via the DevTools protocol
    Chrome,
}

impl RendererKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Chrome => "chrome",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "chrome" | "chromium" => Ok(Self::Chrome),
            other => Err(format!(
                "unknown renderer '{}', expected 'http' or 'chrome'",
                other
            )),
        }
    }
}

/// Waits and delays used by the crawl loop (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Bounded wait for the `<body>` element
    #[serde(default = "default_body_wait_ms")]
    pub body_wait_ms: u64,

    /// Bounded wait for media, anchors or post containers to appear
    #[serde(default = "default_content_wait_ms")]
    pub content_wait_ms: u64,

    /// Bounded wait for each pagination probe
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Pause before the next page when the current one had media
    #[serde(default = "default_delay_with_media_ms")]
    pub delay_with_media_ms: u64,

    /// Pause before the next page when the current one had none
    #[serde(default = "default_delay_without_media_ms")]
    pub delay_without_media_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            body_wait_ms: default_body_wait_ms(),
            content_wait_ms: default_content_wait_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            delay_with_media_ms: default_delay_with_media_ms(),
            delay_without_media_ms: default_delay_without_media_ms(),
        }
    }
}

impl TimingConfig {
    /// Zero waits and delays, for driving the loop against in-memory pages
    pub fn immediate() -> Self {
        Self {
            body_wait_ms: 0,
            content_wait_ms: 0,
            probe_timeout_ms: 0,
            delay_with_media_ms: 0,
            delay_without_media_ms: 0,
        }
    }

    pub fn body_wait(&self) -> Duration {
        Duration::from_millis(self.body_wait_ms)
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_millis(self.content_wait_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Empty pages are skipped through faster than pages that yielded media
    pub fn page_delay(&self, page_had_media: bool) -> Duration {
        if page_had_media {
            Duration::from_millis(self.delay_with_media_ms)
        } else {
            Duration::from_millis(self.delay_without_media_ms)
        }
    }
}

/// A list given either as one comma-separated string or as a TOML array
#[derive(Deserialize)]
#[serde(untagged)]
enum ListInput {
    Joined(String),
    Items(Vec<String>),
}

impl ListInput {
    fn joined(self) -> String {
        match self {
            Self::Joined(s) => s,
            Self::Items(items) => items.join(","),
        }
    }
}

fn extension_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_extensions(&ListInput::deserialize(deserializer)?.joined()))
}

fn pattern_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_list(&ListInput::deserialize(deserializer)?.joined()))
}

fn default_extensions() -> Vec<String> {
    parse_extensions(DEFAULT_EXTENSIONS)
}

fn default_next_patterns() -> Vec<String> {
    parse_list(DEFAULT_NEXT_PATTERNS)
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_page_load_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_body_wait_ms() -> u64 {
    2_000
}

fn default_content_wait_ms() -> u64 {
    3_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_delay_with_media_ms() -> u64 {
    300
}

fn default_delay_without_media_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new("https://site.example/");
        assert_eq!(config.extensions, vec!["mp4", "webm", "avi", "mov"]);
        assert_eq!(
            config.next_patterns,
            vec!["next", ">>", "→", "continue", "more"]
        );
        assert_eq!(config.output_path, PathBuf::from("scraped_links.txt"));
        assert!(config.headless());
        assert_eq!(config.page_limit(), None);
    }

    #[test]
    fn test_zero_max_pages_is_unlimited() {
        let config = Config::new("https://site.example/").with_max_pages(0);
        assert_eq!(config.page_limit(), None);

        let config = Config::new("https://site.example/").with_max_pages(3);
        assert_eq!(config.page_limit(), Some(3));
    }

    #[test]
    fn test_manual_intervention_forces_visible_browser() {
        let mut config = Config::new("https://site.example/");
        config.manual_intervention = true;
        assert!(!config.headless());
    }

    #[test]
    fn test_renderer_kind_from_str() {
        assert_eq!("http".parse::<RendererKind>(), Ok(RendererKind::Http));
        assert_eq!("Chrome".parse::<RendererKind>(), Ok(RendererKind::Chrome));
        assert_eq!(
            "chromium".parse::<RendererKind>(),
            Ok(RendererKind::Chrome)
        );
        assert!("firefox".parse::<RendererKind>().is_err());
    }

    #[test]
    fn test_page_delay_is_shorter_without_media() {
        let timing = TimingConfig::default();
        assert!(timing.page_delay(false) < timing.page_delay(true));
    }
}
