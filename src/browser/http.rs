//! HTTP-backed browser session
//!
//! This module implements the browser collaborator on top of a plain HTTP
//! client:
//! - Building the HTTP client with the configured user agent
//! - GET navigation with a per-call deadline
//! - DOM queries against a static snapshot of the fetched document
//!
//! Pages are not rendered, so content produced by client-side JavaScript is
//! not visible.

use crate::browser::{BrowserError, BrowserPage, BrowserSession, PageResponse};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Maximum redirect hops followed during navigation
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use docs_crawler::browser::build_http_client;
/// use docs_crawler::config::UserAgentConfig;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<reqwest::Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Browser session that fetches pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Creates a session using the given user agent settings
    pub fn new(user_agent: &UserAgentConfig) -> Result<Self, BrowserError> {
        let client = build_http_client(user_agent)
            .map_err(|e| BrowserError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a session from an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrowserSession for HttpBrowser {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        Ok(Box::new(HttpPage::new(self.client.clone())))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        tracing::debug!("HTTP browser session closed");
        Ok(())
    }
}

/// Snapshot of a fetched document
#[derive(Debug, Clone)]
struct LoadedDocument {
    html: String,
}

/// A page backed by one HTTP GET
#[derive(Debug)]
pub struct HttpPage {
    client: Client,
    document: Mutex<Option<LoadedDocument>>,
}

impl HttpPage {
    fn new(client: Client) -> Self {
        Self {
            client,
            document: Mutex::new(None),
        }
    }

    fn document(&self) -> MutexGuard<'_, Option<LoadedDocument>> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn loaded_html(&self) -> Result<String, BrowserError> {
        self.document()
            .as_ref()
            .map(|doc| doc.html.clone())
            .ok_or(BrowserError::PageClosed)
    }
}

#[async_trait]
impl BrowserPage for HttpPage {
    async fn goto(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<PageResponse>, BrowserError> {
        let navigation_error = |e: reqwest::Error| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let navigation = async {
            let response = self.client.get(url).send().await.map_err(navigation_error)?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();

            // Error pages are reported by status whatever their body type
            if response.status().is_success() {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_ascii_lowercase();

                if !content_type.contains("text/html") {
                    return Err(BrowserError::ContentMismatch {
                        url: final_url,
                        content_type,
                    });
                }
            }

            let body = response.text().await.map_err(navigation_error)?;
            Ok::<_, BrowserError>((status, final_url, body))
        };

        let (status, final_url, body) = tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| BrowserError::Timeout(timeout))??;

        *self.document() = Some(LoadedDocument { html: body });

        Ok(Some(PageResponse {
            status,
            url: final_url,
        }))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.loaded_html()
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let html = self.loaded_html()?;

        // The snapshot never changes, so an absent element will not appear later
        if select_first_text(&html, selector)?.is_some() {
            Ok(())
        } else {
            Err(BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn inner_text(&self, selector: &str) -> Result<String, BrowserError> {
        let html = self.loaded_html()?;
        select_first_text(&html, selector)?.ok_or_else(|| BrowserError::SelectorTimeout {
            selector: selector.to_string(),
            timeout: Duration::ZERO,
        })
    }

    async fn links(&self) -> Result<Vec<String>, BrowserError> {
        let html = self.loaded_html()?;
        Ok(extract_hrefs(&html))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.document().take();
        Ok(())
    }
}

/// Returns the text of the first element matching `selector`
///
/// Text nodes are trimmed line by line and blank lines are dropped.
fn select_first_text(html: &str, selector: &str) -> Result<Option<String>, BrowserError> {
    let selector =
        Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    Ok(document.select(&selector).next().map(|element| {
        let text: String = element.text().collect();
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }))
}

/// Extracts raw `href` values from anchor elements
///
/// Anchors carrying a `download` attribute point at files, not pages, and
/// are skipped.
fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
