//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Retry with per-attempt timeouts
//! - Content extraction and HTML to Markdown rendering
//! - The per-page processing pipeline
//! - The frontier queue and crawl lifecycle

mod coordinator;
mod extractor;
mod frontier;
mod markdown;
mod pipeline;
mod retry;

pub use coordinator::{crawl, run_crawl, CrawlContext, ShutdownHandle};
pub use extractor::{
    extract_content, filename_for_url, render_content, MediaKind, PageContent, RawContent,
};
pub use frontier::{Frontier, FrontierEntry};
pub use markdown::{html_to_markdown, tidy_text};
pub use pipeline::{process_page, PageOutcome, SkipReason};
pub use retry::{retry_until_shutdown, retry_with_timeout, Recoverable, RetryError};
