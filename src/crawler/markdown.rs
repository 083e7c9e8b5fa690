//! HTML to Markdown conversion
//!
//! Rendering is best effort: headings, lists, links, code blocks and
//! paragraphs keep their structure, while scripts, styles and other
//! non-content elements are dropped.

use htmd::HtmlToMarkdown;

/// Elements whose content never belongs in the rendered page
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg"];

/// Converts an HTML document or fragment to Markdown
///
/// # Example
///
/// ```
/// use docs_crawler::crawler::html_to_markdown;
///
/// let md = html_to_markdown("<h1>Intro</h1><script>track()</script><p>Hello</p>").unwrap();
/// assert!(md.contains("# Intro"));
/// assert!(!md.contains("track()"));
/// ```
pub fn html_to_markdown(html: &str) -> Result<String, std::io::Error> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let markdown = converter.convert(html)?;
    Ok(tidy_text(&markdown))
}

/// Collapses whitespace in rendered text
///
/// Trailing spaces are removed from every line, runs of blank lines are
/// reduced to one, and the result ends with a single newline.
pub fn tidy_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let md = html_to_markdown("<h1>Title</h1><h2>Section</h2><p>Body text.</p>").unwrap();
        assert!(md.contains("# Title"));
        assert!(md.contains("## Section"));
        assert!(md.contains("Body text."));
    }

    #[test]
    fn test_strips_script_and_style() {
        let html = r#"
            <html>
            <head><style>body { color: red; }</style></head>
            <body>
                <script>window.analytics = true;</script>
                <p>Visible</p>
            </body>
            </html>
        "#;
        let md = html_to_markdown(html).unwrap();
        assert!(md.contains("Visible"));
        assert!(!md.contains("analytics"));
        assert!(!md.contains("color: red"));
    }

    #[test]
    fn test_links_and_lists() {
        let html = r#"<ul><li><a href="/docs/a">Page A</a></li><li>Item two</li></ul>"#;
        let md = html_to_markdown(html).unwrap();
        assert!(md.contains("[Page A](/docs/a)"));
        assert!(md.contains("Item two"));
    }

    #[test]
    fn test_tidy_text_collapses_blank_lines() {
        let text = "\n\nfirst   \n\n\n\nsecond\n\n";
        assert_eq!(tidy_text(text), "first\n\nsecond\n");
    }

    #[test]
    fn test_tidy_text_empty() {
        assert_eq!(tidy_text("  \n \n"), "\n");
    }
}
