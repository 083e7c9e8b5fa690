use url::Url;

/// Returns true if `url` shares the root's origin (scheme, host and port)
pub fn same_origin(url: &Url, root: &Url) -> bool {
    url.origin() == root.origin()
}

/// Returns true if the URL path starts with one of the allowed prefixes
///
/// A prefix written with a trailing slash (`/docs/`) also matches the bare
/// collection path (`/docs`), since normalization strips trailing slashes.
pub fn path_allowed(url: &Url, allowed_paths: &[String]) -> bool {
    let path = url.path();

    allowed_paths.iter().any(|prefix| {
        path.starts_with(prefix.as_str())
            || (prefix.len() > 1 && path == prefix.trim_end_matches('/'))
    })
}

/// Returns true if the URL is inside the crawl scope
pub fn is_in_scope(url: &Url, root: &Url, allowed_paths: &[String]) -> bool {
    same_origin(url, root) && path_allowed(url, allowed_paths)
}
