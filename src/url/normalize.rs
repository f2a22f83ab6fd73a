use crate::url::{classify_link, LinkForm};
use url::Url;

/// Normalizes a media reference into the link that gets persisted
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Scheme-relative (`//host/a.mp4`) becomes `https://host/a.mp4`
/// 3. Root-relative (`/v/a.mp4`) becomes `https://<host>/v/a.mp4`, using the
///    host of the page it was found on; without a host it is left unchanged
/// 4. Everything else passes through unchanged
///
/// # Examples
///
/// ```
/// use media_sweep::url::normalize_link;
///
/// assert_eq!(
///     normalize_link("//cdn.example.com/a.mp4", None),
///     "https://cdn.example.com/a.mp4"
/// );
/// assert_eq!(
///     normalize_link("/v/a.mp4", Some("site.example")),
///     "https://site.example/v/a.mp4"
/// );
/// ```
pub fn normalize_link(link: &str, host: Option<&str>) -> String {
    let link = link.trim();

    match (classify_link(link), host) {
        (LinkForm::ProtocolRelative, _) => format!("https:{}", link),
        (LinkForm::RootRelative, Some(host)) => format!("https://{}{}", host, link),
        _ => link.to_string(),
    }
}

/// Resolves a pagination href against the page it was found on
///
/// Returns None if the href cannot lead to another page:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - hrefs that do not resolve to an HTTP(S) URL
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://site.example/gallery/page/1").unwrap()
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            normalize_link("//cdn.example.com/a.mp4", Some("site.example")),
            "https://cdn.example.com/a.mp4"
        );
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(
            normalize_link("/v/a.mp4", Some("site.example")),
            "https://site.example/v/a.mp4"
        );
    }

    #[test]
    fn test_root_relative_with_port() {
        assert_eq!(
            normalize_link("/v/a.mp4", Some("127.0.0.1:8080")),
            "https://127.0.0.1:8080/v/a.mp4"
        );
    }

    #[test]
    fn test_root_relative_without_host() {
        assert_eq!(normalize_link("/v/a.mp4", None), "/v/a.mp4");
    }

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(
            normalize_link("http://other.example/A.MP4?x=1", Some("site.example")),
            "http://other.example/A.MP4?x=1"
        );
    }

    #[test]
    fn test_bare_unchanged() {
        assert_eq!(
            normalize_link("clips/a.mp4", Some("site.example")),
            "clips/a.mp4"
        );
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(
            normalize_link("  //cdn.example.com/a.mp4\n", None),
            "https://cdn.example.com/a.mp4"
        );
    }

    #[test]
    fn test_resolve_absolute_href() {
        assert_eq!(
            resolve_href("https://other.example/p2", &base_url()),
            Some("https://other.example/p2".to_string())
        );
    }

    #[test]
    fn test_resolve_relative_href() {
        assert_eq!(
            resolve_href("2", &base_url()),
            Some("https://site.example/gallery/page/2".to_string())
        );
        assert_eq!(
            resolve_href("/gallery?page=2", &base_url()),
            Some("https://site.example/gallery?page=2".to_string())
        );
    }

    #[test]
    fn test_skip_non_navigable_hrefs() {
        assert_eq!(resolve_href("", &base_url()), None);
        assert_eq!(resolve_href("#top", &base_url()), None);
        assert_eq!(resolve_href("javascript:void(0)", &base_url()), None);
        assert_eq!(resolve_href("JavaScript:next()", &base_url()), None);
        assert_eq!(resolve_href("mailto:a@site.example", &base_url()), None);
    }
}
