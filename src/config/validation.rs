use crate::config::types::{Config, RendererConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;
    validate_extensions(&config.extensions)?;
    validate_next_patterns(&config.next_patterns)?;
    validate_output_path(config)?;
    validate_renderer_config(&config.renderer)?;
    Ok(())
}

/// Validates the starting URL: present, parseable, HTTP(S)
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    let start_url = start_url.trim();
    if start_url.is_empty() {
        return Err(ConfigError::Validation(
            "Please enter a starting URL".to_string(),
        ));
    }

    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use HTTP or HTTPS",
            start_url
        )));
    }

    Ok(())
}

/// Validates the extension set
///
/// Extensions end up inside regular expressions and CSS attribute selectors,
/// so they are restricted to alphanumeric characters.
fn validate_extensions(extensions: &[String]) -> Result<(), ConfigError> {
    if extensions.is_empty() {
        return Err(ConfigError::Validation(
            "Please enter at least one file type".to_string(),
        ));
    }

    for ext in extensions {
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "File type '{}' must contain only letters and digits",
                ext
            )));
        }
    }

    Ok(())
}

/// An empty pattern list is allowed (the crawl then covers the start page only),
/// blank entries are not
fn validate_next_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    if patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "Next page patterns cannot be blank".to_string(),
        ));
    }
    Ok(())
}

fn validate_output_path(config: &Config) -> Result<(), ConfigError> {
    if config.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.page_load_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "page_load_timeout_ms must be >= 100ms, got {}ms",
            config.page_load_timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
