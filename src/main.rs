//! Docs-Crawler main entry point
//!
//! This is the command-line interface for the Docs-Crawler documentation
//! site crawler.

use anyhow::Context;
use clap::Parser;
use docs_crawler::browser::HttpBrowser;
use docs_crawler::config::{load_config_with_hash, validate, Config};
use docs_crawler::crawler::CrawlContext;
use docs_crawler::output::print_metrics;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Docs-Crawler: a documentation site crawler
///
/// Docs-Crawler walks a documentation site breadth-first from a root URL,
/// stays inside the configured path prefixes, and writes every page it
/// finds to an output directory as Markdown or raw HTML.
#[derive(Parser, Debug)]
#[command(name = "docs-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A documentation site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docs_crawler=info,warn"),
            1 => EnvFilter::new("docs_crawler=debug,info"),
            2 => EnvFilter::new("docs_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    validate(config).context("configuration is invalid")?;

    let crawl = &config.crawl;
    println!("=== Docs-Crawler Dry Run ===\n");

    println!("Crawl:");
    println!("  Root URL: {}", crawl.root_url);
    println!("  Allowed paths: {}", crawl.allowed_paths.join(", "));
    println!("  Max depth: {}", crawl.max_depth);
    println!("  Workers: {}", crawl.max_concurrent);
    println!("  Timeout: {}s", crawl.timeout_secs);
    println!("  Attempts per operation: {}", crawl.max_retries);
    match &crawl.selector {
        Some(selector) => println!("  Content selector: {}", selector),
        None => println!("  Content selector: (full page)"),
    }
    println!(
        "  Output format: {}",
        if crawl.markdown { "markdown" } else { "html" }
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary.display());
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", crawl.root_url);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    validate(&config).context("configuration is invalid")?;

    let browser = HttpBrowser::new(&config.user_agent).context("failed to set up HTTP client")?;
    let context = CrawlContext::prepare(config, Arc::new(browser))
        .await
        .context("failed to start crawl")?;

    let shutdown = context.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            shutdown.shutdown();
        }
    });

    let metrics = context.run().await.context("crawl failed")?;

    println!();
    print_metrics(&metrics);

    Ok(())
}
