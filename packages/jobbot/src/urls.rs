//! URL normalization for candidate job links.
//!
//! Jobs are keyed by scheme+host+path: tracking parameters and fragments on
//! listing links would otherwise make the same posting look new on every
//! crawl.

use url::Url;

/// Normalize an absolute URL: strip query and fragment, keep http(s) only.
pub fn normalize(url: &Url) -> Option<String> {
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Parse and normalize a raw URL string.
pub fn normalize_str(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    normalize(&url)
}

/// Resolve a possibly-relative link against the page it appeared on, then
/// normalize. Links the url crate cannot resolve (e.g. `javascript:`) are
/// dropped.
pub fn resolve_and_normalize(base: &Url, link: &str) -> Option<String> {
    let absolute = base.join(link.trim()).ok()?;
    normalize(&absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_and_fragment() {
        assert_eq!(
            normalize_str("https://x.com/job/1?utm=a#frag"),
            normalize_str("https://x.com/job/1")
        );
        assert_eq!(
            normalize_str("https://x.com/job/1").as_deref(),
            Some("https://x.com/job/1")
        );
    }

    #[test]
    fn normalize_rejects_non_http_schemes() {
        assert_eq!(normalize_str("mailto:jobs@example.com"), None);
        assert_eq!(normalize_str("not a url"), None);
    }

    #[test]
    fn resolve_handles_relative_links() {
        let base = Url::parse("https://careers.example.com/search?page=2").unwrap();
        assert_eq!(
            resolve_and_normalize(&base, "/job/42?src=listing").as_deref(),
            Some("https://careers.example.com/job/42")
        );
        assert_eq!(
            resolve_and_normalize(&base, "job/42").as_deref(),
            Some("https://careers.example.com/job/42")
        );
    }
}
