use crate::UrlError;
use url::Url;

/// Query parameters that never change page content and are dropped
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Href prefixes that never point at a crawlable page
const NON_PAGE_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a link found on a page into a canonical absolute URL
///
/// # Normalization Steps
///
/// 1. Resolve with [`resolve_url`]
/// 2. Normalize path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 3. Remove tracking query parameters, sort the rest, drop an empty `?`
///
/// The result is a dedup key. Fetch the resolved URL instead: dropping the
/// trailing slash changes how relative links on the page resolve.
///
/// # Examples
///
/// ```
/// use docs_crawler::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://x.test/docs/guide/").unwrap();
/// let url = normalize_url("../api/#section", &base).unwrap();
/// assert_eq!(url.as_str(), "https://x.test/docs/api");
/// ```
pub fn normalize_url(raw: &str, base: &Url) -> Result<Url, UrlError> {
    resolve_url(raw, base).map(canonicalize)
}

/// Resolves an href against the page it was found on
///
/// Rejects empty, fragment-only and non-page hrefs (`javascript:`,
/// `mailto:`, `tel:`, `data:`), then requires an http/https scheme and a
/// host. Only the fragment is removed; the path is kept as written.
pub fn resolve_url(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return Err(UrlError::NotAPage(raw.to_string()));
    }

    let lowered = raw.to_ascii_lowercase();
    if NON_PAGE_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return Err(UrlError::NotAPage(raw.to_string()));
    }

    let mut url = base.join(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Canonicalizes an already-resolved URL
fn canonicalize(mut url: Url) -> Url {
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://x.test/docs/guide").unwrap()
    }

    fn norm(raw: &str) -> String {
        normalize_url(raw, &base()).unwrap().to_string()
    }

    #[test]
    fn test_absolute_link() {
        assert_eq!(norm("https://x.test/docs/a"), "https://x.test/docs/a");
    }

    #[test]
    fn test_relative_links_resolve_against_base() {
        assert_eq!(norm("/docs/a"), "https://x.test/docs/a");
        assert_eq!(norm("intro"), "https://x.test/docs/intro");
        assert_eq!(norm("../blog"), "https://x.test/blog");
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(norm("https://x.test/docs/a/"), "https://x.test/docs/a");
    }

    #[test]
    fn test_trailing_slash_variants_dedupe() {
        assert_eq!(norm("/docs/a/"), norm("/docs/a"));
        assert_eq!(norm("/docs/a#top"), norm("/docs/a/"));
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(norm("https://x.test"), "https://x.test/");
        assert_eq!(norm("https://x.test/"), "https://x.test/");
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(norm("/docs/a#section"), "https://x.test/docs/a");
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(norm("https://X.TEST/Docs/A"), "https://x.test/Docs/A");
    }

    #[test]
    fn test_tracking_params_removed_and_sorted() {
        assert_eq!(
            norm("/docs/a?utm_source=feed&b=2&fbclid=1&a=1"),
            "https://x.test/docs/a?a=1&b=2"
        );
        assert_eq!(norm("/docs/a?utm_medium=email"), "https://x.test/docs/a");
    }

    #[test]
    fn test_multiple_slashes() {
        assert_eq!(norm("https://x.test///docs//a///b"), "https://x.test/docs/a/b");
    }

    #[test]
    fn test_reject_non_page_links() {
        for raw in [
            "",
            "   ",
            "#section",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:team@x.test",
            "tel:+1234567890",
            "data:text/html,<h1>hi</h1>",
        ] {
            let result = normalize_url(raw, &base());
            assert!(
                matches!(result, Err(UrlError::NotAPage(_))),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_resolve_keeps_path_as_written() {
        let url = resolve_url("guide/?b=2#top", &base()).unwrap();
        assert_eq!(url.as_str(), "https://x.test/docs/guide/?b=2");
        assert_eq!(canonicalize(url).as_str(), "https://x.test/docs/guide?b=2");
    }

    #[test]
    fn test_reject_non_http_scheme() {
        let result = normalize_url("ftp://x.test/file", &base());
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }
}
