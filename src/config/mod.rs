//! Configuration module for media-sweep
//!
//! This module handles loading, parsing, and validating crawl configuration,
//! either from a TOML file or from the raw comma-separated strings a front end
//! collects.
//!
//! # Example
//!
//! ```no_run
//! use media_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Hunting for: {}", config.extensions.join(", "));
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, RendererConfig, RendererKind, TimingConfig, DEFAULT_EXTENSIONS,
    DEFAULT_NEXT_PATTERNS, DEFAULT_OUTPUT_PATH, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_extensions, parse_list, read_config};
