//! Deduplication tracker
//!
//! Owns the URL → state map for one crawl. Every transition happens under a
//! single lock acquisition, so "check then claim" is atomic no matter how
//! the workers are scheduled.

use crate::state::{FailureKind, UrlState};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Records per-URL lifecycle state with exclusive mutation
#[derive(Debug, Default)]
pub struct DedupTracker {
    records: Mutex<HashMap<String, UrlState>>,
}

impl DedupTracker {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, UrlState>> {
        // A panicking worker cannot leave a half-written map behind: every
        // mutation is a single insert.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `url` as queued if it has never been seen
    ///
    /// Returns true only for the first call with a given URL.
    pub fn try_enqueue(&self, url: &str) -> bool {
        let mut records = self.records();
        if records.contains_key(url) {
            return false;
        }
        records.insert(url.to_string(), UrlState::Queued);
        true
    }

    /// Claims a URL for fetching by marking it visited
    ///
    /// Returns true if this call performed the claim. A URL that is already
    /// visited, processed or failed is left untouched and false is returned,
    /// so exactly one worker fetches each URL.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut records = self.records();
        match records.get(url).cloned() {
            Some(UrlState::Queued) => {
                records.insert(url.to_string(), UrlState::Visited);
                true
            }
            Some(state) => {
                tracing::debug!("Not claiming {} (already {})", url, state.label());
                false
            }
            None => {
                tracing::warn!("Unexpected visit of untracked URL {}", url);
                records.insert(url.to_string(), UrlState::Visited);
                true
            }
        }
    }

    /// Marks a URL as processed
    pub fn mark_processed(&self, url: &str) {
        self.finish(url, UrlState::Processed);
    }

    /// Marks a URL as failed with the given kind and reason
    pub fn mark_failed(&self, url: &str, kind: FailureKind, reason: impl Into<String>) {
        self.finish(
            url,
            UrlState::Failed {
                kind,
                reason: reason.into(),
            },
        );
    }

    fn finish(&self, url: &str, next: UrlState) {
        let mut records = self.records();
        match records.get(url).cloned() {
            Some(UrlState::Visited) => {}
            Some(current) if current.is_terminal() => {
                tracing::warn!(
                    "Ignoring transition of {} to {}: already {}",
                    url,
                    next.label(),
                    current.label()
                );
                return;
            }
            Some(current) => {
                tracing::warn!(
                    "Unexpected transition of {} from {} to {}",
                    url,
                    current.label(),
                    next.label()
                );
            }
            None => {
                tracing::warn!("Unexpected {} for untracked URL {}", next.label(), url);
            }
        }
        records.insert(url.to_string(), next);
    }

    /// Returns the current state of a URL, if tracked
    pub fn state(&self, url: &str) -> Option<UrlState> {
        self.records().get(url).cloned()
    }

    /// Returns true if the URL has been seen in any state
    pub fn contains(&self, url: &str) -> bool {
        self.records().contains_key(url)
    }

    /// Number of tracked URLs
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Returns true if no URL has been tracked yet
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Returns all records sorted by URL
    pub fn snapshot(&self) -> Vec<(String, UrlState)> {
        let mut entries: Vec<(String, UrlState)> = self
            .records()
            .iter()
            .map(|(url, state)| (url.clone(), state.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Returns the failed URLs with their kind and reason, sorted by URL
    pub fn failures(&self) -> Vec<(String, FailureKind, String)> {
        self.snapshot()
            .into_iter()
            .filter_map(|(url, state)| match state {
                UrlState::Failed { kind, reason } => Some((url, kind, reason)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const URL: &str = "https://x.test/docs/a";

    #[test]
    fn test_try_enqueue_is_idempotent() {
        let tracker = DedupTracker::new();

        assert!(tracker.try_enqueue(URL));
        assert!(!tracker.try_enqueue(URL));

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.state(URL), Some(UrlState::Queued));
    }

    #[test]
    fn test_enqueue_after_processing_is_noop() {
        let tracker = DedupTracker::new();
        tracker.try_enqueue(URL);
        tracker.mark_visited(URL);
        tracker.mark_processed(URL);

        assert!(!tracker.try_enqueue(URL));
        assert_eq!(tracker.state(URL), Some(UrlState::Processed));
    }

    #[test]
    fn test_claim_happens_once() {
        let tracker = DedupTracker::new();
        tracker.try_enqueue(URL);

        assert!(tracker.mark_visited(URL));
        assert!(!tracker.mark_visited(URL));
        assert_eq!(tracker.state(URL), Some(UrlState::Visited));
    }

    #[test]
    fn test_full_lifecycle() {
        let tracker = DedupTracker::new();
        tracker.try_enqueue(URL);
        tracker.mark_visited(URL);
        tracker.mark_failed(URL, FailureKind::Network, "HTTP 500");

        assert_eq!(
            tracker.state(URL),
            Some(UrlState::Failed {
                kind: FailureKind::Network,
                reason: "HTTP 500".to_string()
            })
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        let tracker = DedupTracker::new();
        tracker.try_enqueue(URL);
        tracker.mark_visited(URL);
        tracker.mark_processed(URL);

        tracker.mark_failed(URL, FailureKind::Io, "disk full");
        assert_eq!(tracker.state(URL), Some(UrlState::Processed));

        assert!(!tracker.mark_visited(URL));
        assert_eq!(tracker.state(URL), Some(UrlState::Processed));
    }

    #[test]
    fn test_out_of_order_transition_is_applied() {
        let tracker = DedupTracker::new();
        tracker.try_enqueue(URL);

        // Processed before visited is logged but still recorded
        tracker.mark_processed(URL);
        assert_eq!(tracker.state(URL), Some(UrlState::Processed));
    }

    #[test]
    fn test_visit_of_untracked_url() {
        let tracker = DedupTracker::new();
        assert!(tracker.mark_visited(URL));
        assert_eq!(tracker.state(URL), Some(UrlState::Visited));
    }

    #[test]
    fn test_snapshot_and_failures() {
        let tracker = DedupTracker::new();
        for url in ["https://x.test/b", "https://x.test/a", "https://x.test/c"] {
            tracker.try_enqueue(url);
            tracker.mark_visited(url);
        }
        tracker.mark_processed("https://x.test/a");
        tracker.mark_failed("https://x.test/c", FailureKind::Extraction, "no body");

        let snapshot = tracker.snapshot();
        let urls: Vec<&str> = snapshot.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/a", "https://x.test/b", "https://x.test/c"]);

        let failures = tracker.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1, FailureKind::Extraction);
    }

    #[test]
    fn test_concurrent_enqueue_single_winner() {
        let tracker = Arc::new(DedupTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || tracker.try_enqueue(URL))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(tracker.len(), 1);
    }
}
