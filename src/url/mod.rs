//! URL handling module for media-sweep
//!
//! This module provides page host extraction, classification of the shapes a
//! media reference can take in page source, and normalization of those
//! references into absolute links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{page_host, parse_page_url};
pub use normalize::{normalize_link, resolve_href};

/// The shapes a media reference takes in page source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkForm {
    /// Carries its own scheme, e.g. `https://cdn.example.com/a.mp4`
    Absolute,
    /// Scheme-relative, e.g. `//cdn.example.com/a.mp4`
    ProtocolRelative,
    /// Host-relative, e.g. `/v/a.mp4`
    RootRelative,
    /// Anything else, e.g. `clips/a.mp4` or a bare file name
    Bare,
}

/// Classifies a trimmed media reference by its leading characters
///
/// # Examples
///
/// ```
/// use media_sweep::url::{classify_link, LinkForm};
///
/// assert_eq!(classify_link("https://a.example/x.mp4"), LinkForm::Absolute);
/// assert_eq!(classify_link("//a.example/x.mp4"), LinkForm::ProtocolRelative);
/// assert_eq!(classify_link("/x.mp4"), LinkForm::RootRelative);
/// assert_eq!(classify_link("x.mp4"), LinkForm::Bare);
/// ```
pub fn classify_link(link: &str) -> LinkForm {
    if link.starts_with("//") {
        LinkForm::ProtocolRelative
    } else if link.starts_with('/') {
        LinkForm::RootRelative
    } else if has_scheme(link) {
        LinkForm::Absolute
    } else {
        LinkForm::Bare
    }
}

/// A scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` followed by `:`
fn has_scheme(link: &str) -> bool {
    match link.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
