//! Shared helpers for integration tests
//!
//! `ScriptedBrowser` is an in-memory browser session serving a fixed set of
//! pages. It counts navigations per URL so tests can assert what was
//! fetched and how often.

#![allow(dead_code)]

use async_trait::async_trait;
use docs_crawler::browser::{BrowserError, BrowserPage, BrowserSession, PageResponse};
use docs_crawler::config::{Config, CrawlSettings, OutputConfig, UserAgentConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A page served by the scripted browser
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub status: u16,
    pub html: String,
    pub links: Vec<String>,
    /// Text returned for the content selector; `None` means it never appears
    pub selected: Option<String>,
    /// Number of navigations that fail before one succeeds
    pub failures: usize,
    /// Navigation succeeds but produces no response
    pub no_response: bool,
    /// Reading the page content panics
    pub panics: bool,
    /// Reading the page content reports a closed page
    pub closes_on_read: bool,
    /// Time every navigation takes before it settles
    pub delay: Duration,
}

impl ScriptedPage {
    pub fn html(html: &str) -> Self {
        Self {
            status: 200,
            html: html.to_string(),
            links: Vec::new(),
            selected: None,
            failures: 0,
            no_response: false,
            panics: false,
            closes_on_read: false,
            delay: Duration::ZERO,
        }
    }

    pub fn with_links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_selected(mut self, text: &str) -> Self {
        self.selected = Some(text.to_string());
        self
    }

    pub fn failing(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn without_response(mut self) -> Self {
        self.no_response = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn closing_on_read(mut self) -> Self {
        self.closes_on_read = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Site {
    pages: HashMap<String, ScriptedPage>,
    navigations: Mutex<HashMap<String, usize>>,
    opened: AtomicUsize,
    closed_sessions: AtomicUsize,
}

impl Site {
    fn record_navigation(&self, url: &str) -> usize {
        let mut navigations = self.navigations.lock().unwrap();
        let count = navigations.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// In-memory browser session
#[derive(Debug, Clone, Default)]
pub struct ScriptedBrowser {
    site: Arc<Site>,
}

impl ScriptedBrowser {
    pub fn new(pages: Vec<(&str, ScriptedPage)>) -> Self {
        let site = Site {
            pages: pages
                .into_iter()
                .map(|(url, page)| (url.to_string(), page))
                .collect(),
            ..Site::default()
        };
        Self {
            site: Arc::new(site),
        }
    }

    /// Number of navigations to `url`
    pub fn navigations(&self, url: &str) -> usize {
        self.site
            .navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Every URL navigated to, sorted
    pub fn visited(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.site.navigations.lock().unwrap().keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn pages_opened(&self) -> usize {
        self.site.opened.load(Ordering::SeqCst)
    }

    pub fn session_closes(&self) -> usize {
        self.site.closed_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        self.site.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedTab {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.site.closed_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedTab {
    site: Arc<Site>,
    current: Mutex<Option<ScriptedPage>>,
}

impl ScriptedTab {
    fn loaded(&self) -> Result<ScriptedPage, BrowserError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or(BrowserError::PageClosed)
    }
}

#[async_trait]
impl BrowserPage for ScriptedTab {
    async fn goto(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<Option<PageResponse>, BrowserError> {
        let attempt = self.site.record_navigation(url);
        tokio::task::yield_now().await;

        let page = match self.site.pages.get(url) {
            Some(page) => page.clone(),
            None => {
                return Ok(Some(PageResponse {
                    status: 404,
                    url: url.to_string(),
                }))
            }
        };

        if !page.delay.is_zero() {
            tokio::time::sleep(page.delay).await;
        }

        if attempt <= page.failures {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: format!("scripted failure {}", attempt),
            });
        }
        if page.no_response {
            return Ok(None);
        }

        let status = page.status;
        *self.current.lock().unwrap() = Some(page);
        Ok(Some(PageResponse {
            status,
            url: url.to_string(),
        }))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let page = self.loaded()?;
        if page.panics {
            panic!("scripted content panic");
        }
        if page.closes_on_read {
            return Err(BrowserError::PageClosed);
        }
        Ok(page.html)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        match self.loaded()?.selected {
            Some(_) => Ok(()),
            None => Err(BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            }),
        }
    }

    async fn inner_text(&self, selector: &str) -> Result<String, BrowserError> {
        self.loaded()?
            .selected
            .ok_or_else(|| BrowserError::InvalidSelector(selector.to_string()))
    }

    async fn links(&self) -> Result<Vec<String>, BrowserError> {
        Ok(self.loaded()?.links)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        *self.current.lock().unwrap() = None;
        Ok(())
    }
}

/// Builds a valid crawl configuration writing under `output`
pub fn test_config(root_url: &str, allowed: &[&str], max_depth: u32, output: &Path) -> Config {
    Config {
        crawl: CrawlSettings {
            root_url: root_url.to_string(),
            allowed_paths: allowed.iter().map(|p| p.to_string()).collect(),
            max_depth,
            max_concurrent: 3,
            timeout_secs: 5,
            max_retries: 3,
            selector: None,
            markdown: true,
        },
        output: OutputConfig {
            directory: output.to_path_buf(),
            summary_path: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
    }
}
