use crate::config::types::{Config, CrawlSettings, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Longest per-operation timeout accepted, in seconds
const MAX_TIMEOUT_SECS: u64 = 300;

/// Upper bound on concurrent workers
const MAX_CONCURRENT: u32 = 100;

/// Validates the entire configuration
///
/// Runs before any crawl work starts; the first violation is returned.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawl_settings(config: &CrawlSettings) -> Result<(), ConfigError> {
    validate_root_url(&config.root_url)?;
    validate_allowed_paths(&config.allowed_paths)?;

    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_concurrent < 1 || config.max_concurrent > MAX_CONCURRENT {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENT, config.max_concurrent
        )));
    }

    if config.timeout_secs == 0 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be greater than 0 and at most {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if let Some(selector) = &config.selector {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates the root URL: absolute, http(s), with a host
fn validate_root_url(root_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url '{}': {}", root_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must use http or https",
            root_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' has no host",
            root_url
        )));
    }

    Ok(())
}

/// Validates the allow-list of path prefixes
fn validate_allowed_paths(paths: &[String]) -> Result<(), ConfigError> {
    if paths.is_empty() {
        return Err(ConfigError::Validation(
            "allowed-paths must contain at least one path prefix".to_string(),
        ));
    }

    for path in paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "allowed path '{}' must start with '/'",
                path
            )));
        }
    }

    Ok(())
}

/// Validates the content selector: non-empty and parseable
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "selector cannot be empty when present".to_string(),
        ));
    }

    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("selector '{}' is not valid CSS: {:?}", selector, e))
    })?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(summary) = &config.summary_path {
        if summary.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "summary-path cannot be empty when present".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            crawl: CrawlSettings {
                root_url: "https://x.test/docs".to_string(),
                allowed_paths: vec!["/docs".to_string()],
                max_depth: 2,
                max_concurrent: 4,
                timeout_secs: 30,
                max_retries: 3,
                selector: None,
                markdown: true,
            },
            output: OutputConfig {
                directory: PathBuf::from("./site"),
                summary_path: None,
            },
            user_agent: UserAgentConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_allowed_paths_rejected() {
        let mut config = valid_config();
        config.crawl.allowed_paths.clear();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_allowed_path_must_start_with_slash() {
        let mut config = valid_config();
        config.crawl.allowed_paths = vec!["docs".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_root_url_rules() {
        assert!(validate_root_url("https://x.test/docs").is_ok());
        assert!(validate_root_url("http://localhost:8080/").is_ok());

        assert!(validate_root_url("not a url").is_err());
        assert!(validate_root_url("ftp://x.test/docs").is_err());
        assert!(validate_root_url("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = valid_config();

        config.crawl.timeout_secs = 0;
        assert!(validate(&config).is_err());

        config.crawl.timeout_secs = 301;
        assert!(validate(&config).is_err());

        config.crawl.timeout_secs = 300;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = valid_config();

        config.crawl.max_concurrent = 0;
        assert!(validate(&config).is_err());

        config.crawl.max_concurrent = 101;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_retry_count_must_be_positive() {
        let mut config = valid_config();
        config.crawl.max_retries = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_selector_rules() {
        assert!(validate_selector("main .content").is_ok());
        assert!(validate_selector("").is_err());
        assert!(validate_selector("   ").is_err());
        assert!(validate_selector("div[").is_err());
    }

    #[test]
    fn test_crawler_name_rules() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "Bad Name!".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }
}
