/// URL state definitions for tracking crawl progress
///
/// A URL moves `Queued -> Visited -> Processed | Failed` and never leaves a
/// terminal state.
use std::fmt;

/// Category of a per-URL failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Fetch failed, returned a non-success status, or retries were exhausted
    Network,

    /// Content extraction failed
    Extraction,

    /// Writing the extracted content failed
    Io,

    /// Anything else caught at the pipeline boundary
    Unexpected,
}

impl FailureKind {
    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Extraction => "extraction",
            Self::Io => "io",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the current state of a URL in the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlState {
    /// Discovered and waiting in the frontier
    Queued,

    /// Claimed by a worker; network work may be in progress
    Visited,

    /// Fetched, extracted and written
    Processed,

    /// Gave up on this URL
    Failed { kind: FailureKind, reason: String },
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Failed { .. })
    }

    /// Returns true if the URL has been claimed by a worker at some point
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Self::Queued)
    }

    /// Short lowercase label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Visited => "visited",
            Self::Processed => "processed",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { kind, reason } => write!(f, "failed({}): {}", kind, reason),
            other => f.write_str(other.label()),
        }
    }
}
