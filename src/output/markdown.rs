//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a finished
//! crawl: timing, counters, and the URLs that failed.

use crate::output::{CrawlMetrics, OutputResult};
use std::path::Path;

/// Writes a markdown summary of the crawl to `output_path`
///
/// Missing parent directories are created.
pub async fn generate_markdown_summary(
    metrics: &CrawlMetrics,
    root_url: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(metrics, root_url);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output_path, markdown.as_bytes()).await?;

    Ok(())
}

/// Formats crawl metrics as markdown
pub fn format_markdown_summary(metrics: &CrawlMetrics, root_url: &str) -> String {
    let mut md = String::new();

    md.push_str("# Docs-Crawler Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root URL**: {}\n", root_url));
    md.push_str(&format!(
        "- **Started**: {}\n",
        metrics.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        metrics.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n\n",
        metrics.elapsed.as_secs_f64()
    ));

    md.push_str("## Pages\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Discovered | {} |\n", metrics.discovered));
    md.push_str(&format!("| Processed | {} |\n", metrics.processed));
    md.push_str(&format!("| Failed | {} |\n", metrics.failed));
    md.push_str(&format!("| Skipped | {} |\n", metrics.skipped));
    md.push_str(&format!(
        "\n**Success rate**: {:.1}%\n\n",
        metrics.success_rate()
    ));

    if !metrics.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Kind | Reason |\n");
        md.push_str("|-----|------|--------|\n");
        for failure in &metrics.failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.url,
                failure.kind,
                failure.reason.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FailedUrl, MetricsRecorder};
    use crate::state::FailureKind;
    use tempfile::TempDir;

    fn sample_metrics() -> CrawlMetrics {
        let recorder = MetricsRecorder::new();
        recorder.record_discovered();
        recorder.record_discovered();
        recorder.record_processed();
        recorder.record_failed();

        recorder.finalize(vec![FailedUrl {
            url: "https://x.test/docs/broken".to_string(),
            kind: FailureKind::Network,
            reason: "HTTP 500 | upstream".to_string(),
        }])
    }

    #[test]
    fn test_format_contains_counters_and_failures() {
        let md = format_markdown_summary(&sample_metrics(), "https://x.test/docs");

        assert!(md.starts_with("# Docs-Crawler Crawl Summary"));
        assert!(md.contains("- **Root URL**: https://x.test/docs"));
        assert!(md.contains("| Discovered | 2 |"));
        assert!(md.contains("| Processed | 1 |"));
        assert!(md.contains("## Failures"));
        assert!(md.contains("| https://x.test/docs/broken | network | HTTP 500 \\| upstream |"));
    }

    #[test]
    fn test_no_failure_section_when_clean() {
        let recorder = MetricsRecorder::new();
        recorder.record_processed();
        let md = format_markdown_summary(&recorder.finalize(vec![]), "https://x.test/");
        assert!(!md.contains("## Failures"));
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports/summary.md");

        generate_markdown_summary(&sample_metrics(), "https://x.test/docs", &path)
            .await
            .unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("## Pages"));
    }
}
