//! Browser collaborator traits and error types
//!
//! The crawler only needs an opaque page-fetching capability. Anything that
//! can open a page, navigate it and answer a few DOM queries can drive a
//! crawl: a headless browser, a plain HTTP client, or a scripted fake.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a browser session or page
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Selector '{selector}' did not appear within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("{url} is not an HTML page (content type '{content_type}')")]
    ContentMismatch { url: String, content_type: String },

    #[error("Page is not loaded or has been closed")]
    PageClosed,

    #[error("Browser session unavailable: {0}")]
    Unavailable(String),
}

/// Response to a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub url: String,
}

impl PageResponse {
    /// Returns true for 2xx status codes
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A browser session that can open pages
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opens a new blank page
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError>;

    /// Releases the session; called exactly once when a crawl ends
    async fn close(&self) -> Result<(), BrowserError>;
}

/// A single page (tab) in a browser session
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigates to `url`, bounded by `timeout`
    ///
    /// `Ok(None)` means the navigation produced no response at all. A
    /// successful response that is not an HTML document is reported as
    /// `BrowserError::ContentMismatch`.
    async fn goto(&self, url: &str, timeout: Duration)
        -> Result<Option<PageResponse>, BrowserError>;

    /// Returns the serialized HTML of the loaded document
    async fn content(&self) -> Result<String, BrowserError>;

    /// Waits until an element matches `selector`, bounded by `timeout`
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Returns the rendered text of the first element matching `selector`
    async fn inner_text(&self, selector: &str) -> Result<String, BrowserError>;

    /// Returns the raw `href` values of the document's anchor elements
    async fn links(&self) -> Result<Vec<String>, BrowserError>;

    /// Closes the page
    async fn close(&self) -> Result<(), BrowserError>;
}
