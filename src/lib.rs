//! Docs-Crawler: a documentation-site crawler
//!
//! This crate fetches pages through a browser-style session, extracts their
//! content (raw HTML or Markdown), writes it to an output tree, and follows
//! in-scope links breadth-first with a bounded pool of workers.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only `Validation` and `ContextCreation` ever reach the caller of a crawl.
/// The per-page variants are recorded against the URL that produced them.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Validation error: {0}")]
    Validation(#[from] ConfigError),

    #[error("Network error for {url} after {attempts} attempt(s): {reason}")]
    Network {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Content extraction failed for {url}: {reason}")]
    ContentExtraction { url: String, reason: String },

    #[error("Processing failed for {url}: {reason}")]
    Processing { url: String, reason: String },

    #[error("Failed to create crawl context: {0}")]
    ContextCreation(String),
}

impl CrawlError {
    /// Returns the failure kind recorded in the tracker for this error
    pub fn failure_kind(&self) -> state::FailureKind {
        use state::FailureKind;

        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::ContentExtraction { .. } => FailureKind::Extraction,
            Self::Processing { .. } => FailureKind::Io,
            Self::Validation(_) | Self::ContextCreation(_) => FailureKind::Unexpected,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Not a page link: {0}")]
    NotAPage(String),

    #[error("URL is outside the crawl scope: {0}")]
    OutOfScope(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, run_crawl, CrawlContext};
pub use output::CrawlMetrics;
pub use state::{DedupTracker, FailureKind, UrlState};
pub use url::{normalize_url, UrlValidator};
