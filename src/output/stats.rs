//! Crawl metrics
//!
//! Workers update a `MetricsRecorder` while the crawl runs; it is finalized
//! once into an immutable `CrawlMetrics` at shutdown.

use crate::state::FailureKind;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A URL that failed, for final reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Final crawl metrics returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlMetrics {
    /// URLs accepted into the frontier (root included)
    pub discovered: u64,

    /// Pages fetched, extracted and written
    pub processed: u64,

    /// Pages that failed
    pub failed: u64,

    /// Dequeued URLs skipped as duplicate or out of scope
    pub skipped: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,

    /// When the crawl context was created
    pub started_at: DateTime<Utc>,

    /// When the metrics were finalized
    pub finished_at: DateTime<Utc>,

    /// Failed URLs sorted by URL
    pub failures: Vec<FailedUrl>,
}

impl CrawlMetrics {
    /// Fraction of attempted pages that were processed, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.processed + self.failed;
        if attempted == 0 {
            0.0
        } else {
            (self.processed as f64 / attempted as f64) * 100.0
        }
    }
}

/// Live counters updated by workers
#[derive(Debug)]
pub struct MetricsRecorder {
    discovered: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    /// Starts the crawl clock
    pub fn new() -> Self {
        Self {
            discovered: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a processed page and returns the new processed count
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discovered(&self) -> u64 {
        self.discovered.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Freezes the counters into final metrics
    pub fn finalize(&self, failures: Vec<FailedUrl>) -> CrawlMetrics {
        CrawlMetrics {
            discovered: self.discovered.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            failures,
        }
    }
}

/// Receives the final metrics of a crawl
pub trait MetricsSink: Send + Sync {
    fn log_metrics(&self, metrics: &CrawlMetrics);
}

/// Emits final metrics as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn log_metrics(&self, metrics: &CrawlMetrics) {
        tracing::info!(
            discovered = metrics.discovered,
            processed = metrics.processed,
            failed = metrics.failed,
            skipped = metrics.skipped,
            elapsed_ms = metrics.elapsed.as_millis() as u64,
            "Crawl finished"
        );
    }
}

/// Prints metrics to stdout in a formatted manner
pub fn print_metrics(metrics: &CrawlMetrics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages discovered: {}", metrics.discovered);
    println!("  Pages processed: {}", metrics.processed);
    println!("  Pages failed: {}", metrics.failed);
    println!("  URLs skipped: {}", metrics.skipped);
    println!("  Elapsed: {:.2}s", metrics.elapsed.as_secs_f64());
    println!();

    if !metrics.failures.is_empty() {
        println!("Failures ({}):", metrics.failures.len());
        for failure in &metrics.failures {
            println!("  - [{}] {}: {}", failure.kind, failure.url, failure.reason);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        metrics.success_rate(),
        metrics.processed,
        metrics.processed + metrics.failed
    );
}
