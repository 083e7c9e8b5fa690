//! Content extraction
//!
//! Turns a loaded page into the content that gets written to disk:
//! - Selector-based extraction with a bounded wait and full-page fallback
//! - Optional HTML → Markdown rendering
//! - Deterministic output filenames derived from the page URL

use crate::browser::{BrowserError, BrowserPage};
use crate::crawler::markdown::{html_to_markdown, tidy_text};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default file stem for root and collection paths
const INDEX_NAME: &str = "index";

/// Extensions replaced by the output extension
const REPLACED_EXTENSIONS: &[&str] = &[".html", ".htm", ".md"];

/// What was pulled out of the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    /// Inner text of the element matching the content selector
    Selected(String),

    /// Serialized HTML of the whole page
    FullPage(String),
}

/// Kind of content written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Html,
    Markdown,
}

impl MediaKind {
    /// File extension for this kind, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
        }
    }
}

/// Extracted page content ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Content to write
    pub body: String,

    /// Path relative to the output directory
    pub filename: PathBuf,

    /// Media kind of `body`
    pub kind: MediaKind,
}

/// Pulls content out of a loaded page
///
/// With a selector, waits up to `wait` for it and returns the element's
/// inner text. A selector that never appears (or cannot be read) falls back
/// to the full page HTML. Only a page that is no longer reachable fails.
pub async fn extract_content(
    page: &dyn BrowserPage,
    selector: Option<&str>,
    wait: Duration,
) -> Result<RawContent, BrowserError> {
    if let Some(selector) = selector {
        match page.wait_for_selector(selector, wait).await {
            Ok(()) => match page.inner_text(selector).await {
                Ok(text) => return Ok(RawContent::Selected(text)),
                Err(BrowserError::PageClosed) => return Err(BrowserError::PageClosed),
                Err(e) => {
                    tracing::debug!("Reading '{}' failed ({}), using full page", selector, e);
                }
            },
            Err(BrowserError::PageClosed) => return Err(BrowserError::PageClosed),
            Err(e) => {
                tracing::debug!("Selector '{}' unavailable ({}), using full page", selector, e);
            }
        }
    }

    page.content().await.map(RawContent::FullPage)
}

/// Renders raw content into the form written to disk
///
/// HTML is converted to Markdown when requested and passed through
/// untouched otherwise. Selected text is already plain text.
pub fn render_content(
    raw: RawContent,
    url: &Url,
    markdown: bool,
) -> Result<PageContent, std::io::Error> {
    let kind = if markdown {
        MediaKind::Markdown
    } else {
        MediaKind::Html
    };

    let body = match (raw, markdown) {
        (RawContent::FullPage(html), true) => html_to_markdown(&html)?,
        (RawContent::Selected(text), true) => tidy_text(&text),
        (RawContent::FullPage(html), false) => html,
        (RawContent::Selected(text), false) => text,
    };

    Ok(PageContent {
        body,
        filename: filename_for_url(url, kind),
        kind,
    })
}

/// Derives the output path for a URL
///
/// The URL path becomes a relative directory path. Root and collection
/// paths map to `index`, `.html`/`.htm`/`.md` extensions are replaced, and
/// a query string is folded into the file stem so distinct pages never
/// share a file.
///
/// # Example
///
/// ```
/// use docs_crawler::crawler::{filename_for_url, MediaKind};
/// use std::path::PathBuf;
/// use url::Url;
///
/// let url = Url::parse("https://x.test/docs/getting-started.html").unwrap();
/// assert_eq!(
///     filename_for_url(&url, MediaKind::Markdown),
///     PathBuf::from("docs/getting-started.md")
/// );
/// ```
pub fn filename_for_url(url: &Url, kind: MediaKind) -> PathBuf {
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|parts| {
            parts
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .map(sanitize_segment)
                .collect()
        })
        .unwrap_or_default();

    let collection = url.path().ends_with('/');
    let mut stem = if collection {
        INDEX_NAME.to_string()
    } else {
        segments.pop().unwrap_or_else(|| INDEX_NAME.to_string())
    };

    for ext in REPLACED_EXTENSIONS {
        if let Some(stripped) = stem.strip_suffix(ext) {
            if !stripped.is_empty() {
                stem = stripped.to_string();
            }
            break;
        }
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        stem = format!("{}_{}", stem, sanitize_segment(query));
    }

    let mut path: PathBuf = segments.iter().collect();
    path.push(format!("{}.{}", stem, kind.extension()));
    path
}

/// Replaces characters that are unsafe in file names
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
