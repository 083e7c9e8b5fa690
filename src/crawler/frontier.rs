//! Frontier queue shared by the crawl workers
//!
//! A FIFO of (url, depth) entries plus a count of entries that have been
//! handed out but not yet completed. Workers block in `next` until an entry
//! is available, the queue is drained (empty with nothing in flight), or a
//! shutdown is signalled.

use crate::url::ResolvedLink;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{watch, Notify};
use url::Url;

/// A URL waiting to be crawled and its distance from the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Canonical URL, the dedup key
    pub url: Url,

    /// URL as linked; fetched and used as the base for relative links
    pub target: Url,

    pub depth: u32,
}

impl FrontierEntry {
    /// Creates an entry fetched at its canonical URL
    pub fn new(url: Url, depth: u32) -> Self {
        Self {
            target: url.clone(),
            url,
            depth,
        }
    }

    /// Creates an entry from a resolved link
    pub fn from_link(link: ResolvedLink, depth: u32) -> Self {
        Self {
            url: link.canonical,
            target: link.target,
            depth,
        }
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    in_flight: usize,
}

/// Shared FIFO frontier with a join condition
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FrontierState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an entry and wakes waiting workers
    pub fn push(&self, entry: FrontierEntry) {
        self.state().queue.push_back(entry);
        self.notify.notify_waiters();
    }

    /// Takes the next entry, waiting while other workers are still busy
    ///
    /// Returns `None` once the queue is empty and no entry is in flight, or
    /// as soon as `shutdown` reads true. Every `Some` must be matched by a
    /// call to `complete`.
    pub async fn next(&self, shutdown: &mut watch::Receiver<bool>) -> Option<FrontierEntry> {
        loop {
            if *shutdown.borrow() {
                return None;
            }

            // Registered before inspecting the queue so a push between the
            // check and the wait is not missed
            let notified = self.notify.notified();
            tokio::pin!(notified);

            {
                let mut state = self.state();
                if let Some(entry) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(entry);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: no shutdown can arrive any more
                        (&mut notified).await;
                    }
                }
            }
        }
    }

    /// Marks one dequeued entry as finished
    ///
    /// Push any links discovered while processing the entry before calling
    /// this, otherwise idle workers may observe a drained queue too early.
    pub fn complete(&self) {
        {
            let mut state = self.state();
            if state.in_flight == 0 {
                tracing::warn!("Frontier completion without a matching dequeue");
            } else {
                state.in_flight -= 1;
            }
        }
        self.notify.notify_waiters();
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.state().queue.is_empty()
    }

    /// Number of entries handed out and not yet completed
    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Returns true when the queue is empty and nothing is in flight
    pub fn is_drained(&self) -> bool {
        let state = self.state();
        state.queue.is_empty() && state.in_flight == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(path: &str, depth: u32) -> FrontierEntry {
        FrontierEntry::new(Url::parse(&format!("https://x.test{}", path)).unwrap(), depth)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new();
        let (_tx, mut rx) = watch::channel(false);

        frontier.push(entry("/a", 0));
        frontier.push(entry("/b", 1));

        assert_eq!(frontier.next(&mut rx).await, Some(entry("/a", 0)));
        assert_eq!(frontier.next(&mut rx).await, Some(entry("/b", 1)));
        assert_eq!(frontier.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_drained_returns_none() {
        let frontier = Frontier::new();
        let (_tx, mut rx) = watch::channel(false);

        assert!(frontier.is_drained());
        assert_eq!(frontier.next(&mut rx).await, None);
    }

    #[tokio::test]
    async fn test_waits_for_in_flight_work() {
        let frontier = Frontier::new();
        let (_tx, rx) = watch::channel(false);
        frontier.push(entry("/root", 0));

        let mut first_rx = rx.clone();
        let root = frontier.next(&mut first_rx).await;
        assert!(root.is_some());

        let waiter = async {
            let mut rx = rx.clone();
            frontier.next(&mut rx).await
        };
        let producer = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            frontier.push(entry("/child", 1));
            frontier.complete();
        };

        let (next, ()) = tokio::join!(waiter, producer);
        assert_eq!(next, Some(entry("/child", 1)));
    }

    #[tokio::test]
    async fn test_waiter_released_when_last_work_completes() {
        let frontier = Frontier::new();
        let (_tx, mut rx) = watch::channel(false);
        frontier.push(entry("/root", 0));
        frontier.next(&mut rx).await.unwrap();

        let mut waiter_rx = rx.clone();
        let waiter = frontier.next(&mut waiter_rx);
        let finisher = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            frontier.complete();
        };

        let (next, ()) = tokio::join!(waiter, finisher);
        assert_eq!(next, None);
        assert!(frontier.is_drained());
    }

    #[tokio::test]
    async fn test_shutdown_stops_dequeue() {
        let frontier = Frontier::new();
        let (tx, mut rx) = watch::channel(false);
        frontier.push(entry("/a", 0));
        frontier.push(entry("/b", 0));

        tx.send_replace(true);

        assert_eq!(frontier.next(&mut rx).await, None);
        assert_eq!(frontier.len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_wakes_blocked_worker() {
        let frontier = Frontier::new();
        let (tx, rx) = watch::channel(false);
        frontier.push(entry("/root", 0));

        let mut first_rx = rx.clone();
        frontier.next(&mut first_rx).await.unwrap();

        let mut waiter_rx = rx.clone();
        let waiter = frontier.next(&mut waiter_rx);
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send_replace(true);
        };

        let (next, ()) = tokio::join!(waiter, stopper);
        assert_eq!(next, None);
    }
}
