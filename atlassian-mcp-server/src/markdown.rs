//! Confluence storage format to Markdown

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use std::panic::{self, AssertUnwindSafe};

/// Convert Confluence storage HTML to Markdown.
///
/// html2md has no error path but can panic on pathological markup; that
/// surfaces as a conversion error instead of a handler panic.
pub fn html_to_markdown(html: &str) -> AtlassianMcpResult<String> {
    panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(html)))
        .map(|markdown| markdown.trim().to_string())
        .map_err(|_| AtlassianMcpError::conversion("html2md could not parse the page body"))
}

/// Render a page body either as Markdown or as the raw storage value.
pub fn render_body(html: &str, convert_to_markdown: bool) -> AtlassianMcpResult<String> {
    if convert_to_markdown {
        html_to_markdown(html)
    } else {
        Ok(html.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let markdown = html_to_markdown("<h1>Title</h1><p>Hello <strong>world</strong></p>").unwrap();
        assert!(markdown.contains("Title"));
        assert!(markdown.contains("**world**"));
        assert!(!markdown.contains("<p>"));
    }

    #[test]
    fn test_raw_body_passthrough() {
        assert_eq!(render_body("<p>x</p>", false).unwrap(), "<p>x</p>");
    }
}
