use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the host a root-relative link is resolved against
///
/// The host is lowercased and keeps an explicit, non-default port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use media_sweep::url::page_host;
///
/// let url = Url::parse("https://Site.Example/gallery?page=2").unwrap();
/// assert_eq!(page_host(&url), Some("site.example".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(page_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn page_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses a page URL reported by the renderer
///
/// Only HTTP(S) URLs with a host are accepted.
pub fn parse_page_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
