//! Output module for crawl results
//!
//! This module handles:
//! - Writing extracted pages to the output tree
//! - Recording crawl metrics
//! - Generating the markdown crawl summary

mod markdown;
pub mod stats;
mod writer;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{
    print_metrics, CrawlMetrics, FailedUrl, MetricsRecorder, MetricsSink, TracingMetricsSink,
};
pub use writer::ContentStore;

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to write outside the output directory: {0}")]
    UnsafePath(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
