//! Crawl context - crawl lifecycle and worker orchestration
//!
//! The context owns everything one crawl invocation shares:
//! - Validated configuration and the URL validator
//! - The frontier queue and dedup tracker
//! - The browser session and the serialized content store
//! - Live metrics, the logging span and the shutdown channel

use crate::browser::BrowserSession;
use crate::config::{validate, Config};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::pipeline::{process_page, PageOutcome};
use crate::output::{
    generate_markdown_summary, ContentStore, CrawlMetrics, FailedUrl, MetricsRecorder,
    MetricsSink, TracingMetricsSink,
};
use crate::state::DedupTracker;
use crate::url::UrlValidator;
use crate::{CrawlError, Result};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Requests a running crawl to stop
///
/// Workers stop taking new entries; pages in flight stop at their next
/// suspension point without being marked processed.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signals shutdown; calling it more than once is harmless
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }
}

/// State shared by every worker of one crawl
pub struct CrawlContext {
    config: Config,
    validator: UrlValidator,
    frontier: Frontier,
    tracker: DedupTracker,
    browser: Arc<dyn BrowserSession>,
    store: ContentStore,
    metrics: MetricsRecorder,
    sink: Arc<dyn MetricsSink>,
    span: tracing::Span,
    shutdown: Arc<watch::Sender<bool>>,
    started: AtomicBool,
}

impl CrawlContext {
    /// Creates a crawl context seeded with the root URL at depth 0
    ///
    /// # Errors
    ///
    /// * `CrawlError::Validation` - The configuration is invalid
    /// * `CrawlError::ContextCreation` - The output directory cannot be created
    pub async fn create(config: Config, browser: Arc<dyn BrowserSession>) -> Result<Self> {
        validate(&config)?;

        let validator = UrlValidator::new(&config.crawl.root_url, config.crawl.allowed_paths.clone())
            .map_err(|e| CrawlError::ContextCreation(format!("invalid root URL: {}", e)))?;

        let store = ContentStore::new(&config.output.directory);
        store
            .ensure_directory(store.root())
            .await
            .map_err(|e| {
                CrawlError::ContextCreation(format!(
                    "cannot create output directory {}: {}",
                    store.root().display(),
                    e
                ))
            })?;

        let span = tracing::info_span!("crawl", root = %validator.root());
        let (shutdown, _) = watch::channel(false);

        let context = Self {
            config,
            validator,
            frontier: Frontier::new(),
            tracker: DedupTracker::new(),
            browser,
            store,
            metrics: MetricsRecorder::new(),
            sink: Arc::new(TracingMetricsSink),
            span,
            shutdown: Arc::new(shutdown),
            started: AtomicBool::new(false),
        };

        let root = context.validator.root_link();
        if context.tracker.try_enqueue(root.canonical.as_str()) {
            context.metrics.record_discovered();
            context.frontier.push(FrontierEntry::from_link(root, 0));
        }

        Ok(context)
    }

    /// Like `create`, but releases `browser` when the context cannot be built
    ///
    /// Use this when the context is the only owner expected to close the
    /// session.
    pub async fn prepare(config: Config, browser: Arc<dyn BrowserSession>) -> Result<Self> {
        match Self::create(config, Arc::clone(&browser)).await {
            Ok(context) => Ok(context),
            Err(e) => {
                close_session(browser.as_ref()).await;
                Err(e)
            }
        }
    }

    /// Replaces the sink that receives the final metrics
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns a handle that stops this crawl
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown),
        }
    }

    /// Runs the workers until the frontier drains or shutdown is requested
    ///
    /// Cleanup always runs: final metrics are logged, the browser session
    /// is released and the optional summary report is written. A context
    /// runs once; later calls fail with `CrawlError::ContextCreation`.
    pub async fn run(&self) -> Result<CrawlMetrics> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CrawlError::ContextCreation(
                "crawl context has already been run".to_string(),
            ));
        }

        let workers = self.config.crawl.max_concurrent.max(1);
        self.span.in_scope(|| {
            tracing::info!(
                workers,
                max_depth = self.config.crawl.max_depth,
                "Starting crawl into {}",
                self.store.root().display()
            )
        });

        let pool = (0..workers).map(|id| {
            self.worker(id)
                .instrument(tracing::info_span!(parent: &self.span, "worker", id))
        });
        join_all(pool).await;

        Ok(self.cleanup().instrument(self.span.clone()).await)
    }

    async fn worker(&self, id: u32) {
        let mut shutdown = self.shutdown.subscribe();

        while let Some(entry) = self.frontier.next(&mut shutdown).await {
            if let PageOutcome::Processed { links } = process_page(self, &entry).await {
                for link in links {
                    if self.tracker.try_enqueue(link.url.as_str()) {
                        self.metrics.record_discovered();
                        self.frontier.push(link);
                    }
                }
            }
            self.frontier.complete();
        }

        tracing::debug!(id, "Worker finished");
    }

    async fn cleanup(&self) -> CrawlMetrics {
        if self.is_cancelled() {
            tracing::warn!(
                "Crawl stopped by shutdown request with {} URLs still queued",
                self.frontier.len()
            );
        }

        let collisions = self.store.collisions();
        if collisions > 0 {
            tracing::warn!(
                collisions,
                "Some pages mapped to a file already written by another URL"
            );
        }

        let failures = self
            .tracker
            .failures()
            .into_iter()
            .map(|(url, kind, reason)| FailedUrl { url, kind, reason })
            .collect();
        let metrics = self.metrics.finalize(failures);
        self.sink.log_metrics(&metrics);

        close_session(self.browser.as_ref()).await;

        if let Some(path) = &self.config.output.summary_path {
            match generate_markdown_summary(&metrics, self.validator.root().as_str(), path).await {
                Ok(()) => tracing::info!("Wrote crawl summary to {}", path.display()),
                Err(e) => tracing::warn!("Failed to write crawl summary: {}", e),
            }
        }

        metrics
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    pub(crate) fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Returns the dedup tracker of this crawl
    pub fn tracker(&self) -> &DedupTracker {
        &self.tracker
    }

    pub(crate) fn browser(&self) -> &dyn BrowserSession {
        self.browser.as_ref()
    }

    pub(crate) fn store(&self) -> &ContentStore {
        &self.store
    }

    pub(crate) fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub(crate) fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

async fn close_session(browser: &dyn BrowserSession) {
    if let Err(e) = browser.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
}

/// Runs a complete crawl with the given browser session
///
/// Invalid configuration fails before any page is fetched. The session is
/// released whether or not the crawl could start.
///
/// # Example
///
/// ```no_run
/// use docs_crawler::browser::HttpBrowser;
/// use docs_crawler::config::load_config;
/// use docs_crawler::crawler::crawl;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let browser = Arc::new(HttpBrowser::new(&config.user_agent)?);
/// let metrics = crawl(config, browser).await?;
/// println!("{} pages processed", metrics.processed);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, browser: Arc<dyn BrowserSession>) -> Result<CrawlMetrics> {
    let context = CrawlContext::prepare(config, browser).await?;
    context.run().await
}

/// Runs a complete crawl over plain HTTP
///
/// # Errors
///
/// * `CrawlError::Validation` - The configuration is invalid
/// * `CrawlError::ContextCreation` - The HTTP client or output directory
///   could not be set up
pub async fn run_crawl(config: Config) -> Result<CrawlMetrics> {
    validate(&config)?;

    let browser = crate::browser::HttpBrowser::new(&config.user_agent)
        .map_err(|e| CrawlError::ContextCreation(e.to_string()))?;

    crawl(config, Arc::new(browser)).await
}
