use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a crawl
///
/// Created once at start and read-only for the lifetime of the crawl.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlSettings,
    pub output: OutputConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// URL the crawl starts from (depth 0)
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Path prefixes a discovered link must start with to be crawled
    #[serde(rename = "allowed-paths")]
    pub allowed_paths: Vec<String>,

    /// Maximum link depth to follow from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: u32,

    /// Per-operation timeout for page fetches and extraction (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts for page fetches and extraction
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Optional CSS selector for the main content element
    #[serde(default)]
    pub selector: Option<String>,

    /// Convert extracted HTML to Markdown before writing
    #[serde(default = "default_markdown")]
    pub markdown: bool,
}

impl CrawlSettings {
    /// Returns the per-operation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_markdown() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the extracted pages are written under
    pub directory: PathBuf,

    /// Optional path of the markdown crawl summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<PathBuf>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DocsCrawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}
