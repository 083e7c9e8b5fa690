//! Per-page processing pipeline
//!
//! Normalize → claim → scope check → fetch → extract → persist → discover
//! links. Every per-page error, including a panic, is turned into a
//! `Failed` tracker entry here and never reaches the worker loop.
//!
//! The canonical URL is the dedup key and names the output file. The page
//! itself is fetched at the URL as it was linked.

use crate::browser::{BrowserError, BrowserPage};
use crate::crawler::coordinator::CrawlContext;
use crate::crawler::extractor::{extract_content, render_content};
use crate::crawler::frontier::FrontierEntry;
use crate::crawler::retry::{retry_until_shutdown, RetryError};
use crate::state::FailureKind;
use crate::{CrawlError, UrlError};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use url::Url;

/// Why a dequeued URL was not fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The URL could not be normalized
    Invalid(UrlError),

    /// Another worker already claimed the URL
    AlreadyClaimed,

    /// The URL falls outside the root origin or allowed paths
    OutOfScope,

    /// The server answered with something other than an HTML document
    NotHtml { content_type: String },
}

/// Result of running one frontier entry through the pipeline
#[derive(Debug)]
pub enum PageOutcome {
    /// Page written; `links` are untracked in-scope links at depth + 1
    Processed { links: Vec<FrontierEntry> },

    Skipped(SkipReason),

    /// Page failed; already recorded in the tracker and metrics
    Failed(CrawlError),

    /// Shutdown observed mid-page; the URL stays visited
    Cancelled,
}

enum StageOutcome {
    Done(Vec<FrontierEntry>),
    Skipped(SkipReason),
    Cancelled,
}

/// Processes one frontier entry
pub async fn process_page(ctx: &CrawlContext, entry: &FrontierEntry) -> PageOutcome {
    let url = match ctx.validator().normalize(entry.url.as_str(), &entry.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping {}: {}", entry.url, e);
            ctx.metrics().record_skipped();
            return PageOutcome::Skipped(SkipReason::Invalid(e));
        }
    };

    // Claim before any network work
    if !ctx.tracker().mark_visited(url.as_str()) {
        tracing::debug!("Skipping {}: already claimed", url);
        ctx.metrics().record_skipped();
        return PageOutcome::Skipped(SkipReason::AlreadyClaimed);
    }

    if let Err(e) = ctx.validator().check_scope(&url) {
        tracing::debug!("Skipping {}: {}", url, e);
        ctx.metrics().record_skipped();
        return PageOutcome::Skipped(SkipReason::OutOfScope);
    }

    let stages =
        AssertUnwindSafe(run_stages(ctx, &url, &entry.target, entry.depth)).catch_unwind();

    match stages.await {
        Ok(Ok(StageOutcome::Done(links))) => PageOutcome::Processed { links },
        Ok(Ok(StageOutcome::Skipped(reason))) => {
            tracing::debug!("Skipping {}: {:?}", url, reason);
            ctx.metrics().record_skipped();
            PageOutcome::Skipped(reason)
        }
        Ok(Ok(StageOutcome::Cancelled)) => {
            tracing::info!("Stopped processing {} after shutdown", url);
            PageOutcome::Cancelled
        }
        Ok(Err(error)) => {
            record_failure(ctx, &url, error.failure_kind(), &error);
            PageOutcome::Failed(error)
        }
        Err(panic) => {
            let error = CrawlError::Processing {
                url: url.to_string(),
                reason: format!("unexpected panic: {}", panic_message(&*panic)),
            };
            record_failure(ctx, &url, FailureKind::Unexpected, &error);
            PageOutcome::Failed(error)
        }
    }
}

fn record_failure(ctx: &CrawlContext, url: &Url, kind: FailureKind, error: &CrawlError) {
    tracing::error!(url = %url, kind = %kind, "{}", error);
    ctx.tracker().mark_failed(url.as_str(), kind, error.to_string());
    ctx.metrics().record_failed();
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

async fn run_stages(
    ctx: &CrawlContext,
    url: &Url,
    target: &Url,
    depth: u32,
) -> Result<StageOutcome, CrawlError> {
    let page = ctx
        .browser()
        .new_page()
        .await
        .map_err(|e| CrawlError::Network {
            url: url.to_string(),
            attempts: 1,
            reason: format!("could not open page: {}", e),
        })?;

    let result = load_and_persist(ctx, page.as_ref(), url, target, depth).await;

    if let Err(e) = page.close().await {
        tracing::debug!("Closing page for {} failed: {}", url, e);
    }

    result
}

/// Fetches `target`, then writes the page under its canonical `url`
async fn load_and_persist(
    ctx: &CrawlContext,
    page: &dyn BrowserPage,
    url: &Url,
    target: &Url,
    depth: u32,
) -> Result<StageOutcome, CrawlError> {
    let settings = &ctx.config().crawl;
    let timeout = settings.timeout();
    let attempts = settings.max_retries;
    let target_str = target.as_str();

    // Fetch
    let fetched = retry_until_shutdown(
        move |_| page.goto(target_str, timeout),
        attempts,
        timeout,
        Some(ctx.shutdown_receiver()),
    )
    .await;

    let response = match fetched {
        Ok(response) => response,
        Err(RetryError::Cancelled { .. }) => return Ok(StageOutcome::Cancelled),
        Err(RetryError::Failed {
            error: BrowserError::ContentMismatch { content_type, .. },
            ..
        }) => return Ok(StageOutcome::Skipped(SkipReason::NotHtml { content_type })),
        Err(e) => {
            return Err(CrawlError::Network {
                url: url.to_string(),
                attempts: e.attempts(),
                reason: e.to_string(),
            })
        }
    };

    let response = match response {
        Some(response) if response.ok() => response,
        Some(response) => {
            return Err(CrawlError::Network {
                url: url.to_string(),
                attempts: 1,
                reason: format!("HTTP {}", response.status),
            })
        }
        None => {
            return Err(CrawlError::Network {
                url: url.to_string(),
                attempts: 1,
                reason: "navigation produced no response".to_string(),
            })
        }
    };

    if ctx.is_cancelled() {
        return Ok(StageOutcome::Cancelled);
    }

    // Extract; the selector wait stays inside the attempt deadline
    let selector = settings.selector.as_deref();
    let selector_wait = timeout / 2;
    let extracted = retry_until_shutdown(
        move |_| extract_content(page, selector, selector_wait),
        attempts,
        timeout,
        Some(ctx.shutdown_receiver()),
    )
    .await;

    let raw = match extracted {
        Ok(raw) => raw,
        Err(RetryError::Cancelled { .. }) => return Ok(StageOutcome::Cancelled),
        Err(e) => {
            return Err(CrawlError::ContentExtraction {
                url: url.to_string(),
                reason: e.to_string(),
            })
        }
    };

    if ctx.is_cancelled() {
        return Ok(StageOutcome::Cancelled);
    }

    let content =
        render_content(raw, url, settings.markdown).map_err(|e| CrawlError::ContentExtraction {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Persist
    let written = ctx
        .store()
        .persist(&content)
        .await
        .map_err(|e| CrawlError::Processing {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    ctx.tracker().mark_processed(url.as_str());
    let processed = ctx.metrics().record_processed();
    tracing::info!(depth, "Processed {} -> {}", url, written.display());

    if processed % 10 == 0 {
        let elapsed = ctx.metrics().elapsed();
        tracing::info!(
            "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
            processed,
            ctx.frontier().len(),
            processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
        );
    }

    if depth >= settings.max_depth {
        return Ok(StageOutcome::Done(Vec::new()));
    }

    // Relative links resolve against the document as served, not the dedup key
    let base = Url::parse(&response.url).unwrap_or_else(|_| target.clone());
    Ok(StageOutcome::Done(discover_links(ctx, page, &base, depth + 1).await))
}

/// Collects in-scope links not yet tracked, paired with `next_depth`
async fn discover_links(
    ctx: &CrawlContext,
    page: &dyn BrowserPage,
    base: &Url,
    next_depth: u32,
) -> Vec<FrontierEntry> {
    let hrefs = match page.links().await {
        Ok(hrefs) => hrefs,
        Err(e) => {
            tracing::warn!("Link discovery failed for {}: {}", base, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs {
        let link = match ctx.validator().validate_link(&href, base) {
            Ok(link) => link,
            Err(e) => {
                tracing::trace!("Ignoring link {}: {}", href, e);
                continue;
            }
        };

        let key = link.canonical.as_str();
        if ctx.tracker().contains(key) || !seen.insert(key.to_string()) {
            continue;
        }
        links.push(FrontierEntry::from_link(link, next_depth));
    }

    tracing::debug!("Discovered {} new links on {}", links.len(), base);
    links
}
