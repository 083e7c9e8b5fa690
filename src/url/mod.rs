//! URL handling module for Docs-Crawler
//!
//! This module provides link normalization and scope containment. Both are
//! pure functions; `UrlValidator` binds them to one crawl's root URL and
//! allowed path prefixes.

mod normalize;
mod scope;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use normalize::{normalize_url, resolve_url};
pub use scope::{is_in_scope, path_allowed, same_origin};

/// A link in the two forms the crawler needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Normalized form, used for dedup, scope and file names
    pub canonical: Url,

    /// Resolved form as linked, used for fetching and as the base of
    /// relative links on the fetched page
    pub target: Url,
}

/// Canonicalizes discovered links and decides whether they are in scope
#[derive(Debug, Clone)]
pub struct UrlValidator {
    root: Url,
    root_target: Url,
    allowed_paths: Vec<String>,
}

impl UrlValidator {
    /// Creates a validator for the given root URL and path prefixes
    ///
    /// The root URL is normalized with itself as the base.
    pub fn new(root_url: &str, allowed_paths: Vec<String>) -> UrlResult<Self> {
        let parsed = Url::parse(root_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let root_target = resolve_url(root_url, &parsed)?;
        let root = normalize_url(root_url, &parsed)?;

        Ok(Self {
            root,
            root_target,
            allowed_paths,
        })
    }

    /// Returns the normalized root URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Returns the root URL as configured, for fetching
    pub fn root_link(&self) -> ResolvedLink {
        ResolvedLink {
            canonical: self.root.clone(),
            target: self.root_target.clone(),
        }
    }

    /// Normalizes a raw link found on the page at `base`
    pub fn normalize(&self, raw: &str, base: &Url) -> UrlResult<Url> {
        normalize_url(raw, base)
    }

    /// Checks an already-normalized URL against the crawl scope
    pub fn check_scope(&self, url: &Url) -> UrlResult<()> {
        if is_in_scope(url, &self.root, &self.allowed_paths) {
            Ok(())
        } else {
            Err(UrlError::OutOfScope(url.to_string()))
        }
    }

    /// Normalizes a raw link and rejects it when out of scope
    ///
    /// # Examples
    ///
    /// ```
    /// use docs_crawler::url::UrlValidator;
    ///
    /// let validator = UrlValidator::new("https://x.test/docs", vec!["/docs".to_string()]).unwrap();
    /// let base = validator.root().clone();
    ///
    /// assert!(validator.validate("/docs/a/", &base).is_ok());
    /// assert!(validator.validate("/blog", &base).is_err());
    /// ```
    pub fn validate(&self, raw: &str, base: &Url) -> UrlResult<Url> {
        self.validate_link(raw, base).map(|link| link.canonical)
    }

    /// Like `validate`, but also keeps the URL as linked
    pub fn validate_link(&self, raw: &str, base: &Url) -> UrlResult<ResolvedLink> {
        let target = resolve_url(raw, base)?;
        let canonical = self.normalize(target.as_str(), &target)?;
        self.check_scope(&canonical)?;
        Ok(ResolvedLink { canonical, target })
    }
}
