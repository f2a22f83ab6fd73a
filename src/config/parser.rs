use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use media_sweep::config::load_config;
///
/// let config = load_config(Path::new("sweep.toml")).unwrap();
/// println!("Extensions: {:?}", config.extensions);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads and parses a configuration file without validating it
///
/// Front ends use this when command-line values still have to be layered on
/// top (a file may leave `start-url` to the command line, for instance).
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Splits a comma-separated list into trimmed, lowercased, non-empty entries
///
/// Order is preserved.
///
/// ```
/// use media_sweep::config::parse_list;
///
/// assert_eq!(parse_list(" Next, ,MORE "), vec!["next", "more"]);
/// ```
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parses a comma-separated extension list
///
/// Like [`parse_list`], but a leading dot is optional and repeated entries are
/// dropped, keeping the first occurrence.
///
/// ```
/// use media_sweep::config::parse_extensions;
///
/// assert_eq!(parse_extensions(".MP4, webm,mp4"), vec!["mp4", "webm"]);
/// ```
pub fn parse_extensions(raw: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();

    for item in parse_list(raw) {
        let ext = item.trim_start_matches('.').trim().to_string();
        if !ext.is_empty() && !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }

    extensions
}
