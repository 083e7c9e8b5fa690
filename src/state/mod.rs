//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: lifecycle of a single URL (queued, visited, processed, failed)
//! - `FailureKind`: why a URL failed
//! - `DedupTracker`: the shared URL → state map that prevents duplicate work

mod page_state;
mod tracker;

// Re-export main types
pub use page_state::{FailureKind, UrlState};
pub use tracker::DedupTracker;
