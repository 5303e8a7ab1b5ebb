// src/extract/mod.rs
// =============================================================================
// Content extraction: raw HTML in, title + sanitized blocks out.
//
// Submodules:
// - locate: strips page chrome and finds the main content container
// - blocks: walks that container and builds ContentBlocks
// - sanitize: allowlist sanitizer and email highlighter used by blocks
// =============================================================================

mod blocks;
mod locate;
mod sanitize;

pub use locate::collapse_whitespace;

use blocks::{extract_blocks, Extracted};
use locate::{locate_content, page_title, remove_noise, Located};

use crate::config::ExtractOptions;
use crate::error::ParseError;
use crate::model::ContentBlock;
use scraper::Html;
use std::collections::BTreeSet;
use tracing::debug;

/// What extraction found on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub blocks: Vec<ContentBlock>,
    pub emails: BTreeSet<String>,
    /// No content container matched and <body> was used
    pub used_fallback: bool,
}

// Extracts content from an already parsed document
//
// The document is modified: noise elements are detached from it. Anything
// that needs the untouched page (link discovery) must run first.
pub fn extract_document(
    document: &mut Html,
    options: &ExtractOptions,
) -> Result<PageContent, ParseError> {
    let title = page_title(document);

    remove_noise(document);
    let located = locate_content(document)?;

    let paragraph_limit = if located.is_fallback() {
        options.fallback_paragraph_limit
    } else {
        None
    };

    if let Located::Container { selector, .. } = located {
        debug!("Content container matched `{}`", selector);
    } else {
        debug!("No content container matched, using <body>");
    }

    let Extracted { blocks, emails } = extract_blocks(located.element(), paragraph_limit);

    Ok(PageContent {
        title,
        blocks,
        emails,
        used_fallback: located.is_fallback(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_page(html: &str, options: &ExtractOptions) -> Result<PageContent, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let mut document = Html::parse_document(html);
        extract_document(&mut document, options)
    }

    #[test]
    fn test_contact_paragraph_is_highlighted() {
        let content = extract_page(
            "<html><body><p>Contact me@x.com</p></body></html>",
            &ExtractOptions::default(),
        )
        .unwrap();
        assert_eq!(
            content.blocks,
            vec![ContentBlock::Paragraph {
                html: r#"<p>Contact <span class="email-highlight">me@x.com</span></p>"#.to_string()
            }]
        );
        assert!(content.emails.contains("me@x.com"));
        assert_eq!(content.title, "No Title");
    }

    #[test]
    fn test_body_fallback_truncates_paragraphs() {
        let paragraphs: String = (1..=25).map(|i| format!("<p>Paragraph {}</p>", i)).collect();
        let html = format!("<html><body><div class=\"wrap\">{}</div></body></html>", paragraphs);

        let content = extract_page(&html, &ExtractOptions::default()).unwrap();
        assert!(content.used_fallback);
        assert_eq!(content.blocks.len(), 20);
        assert_eq!(content.blocks[19].html(), "<p>Paragraph 20</p>");

        let unlimited = ExtractOptions {
            fallback_paragraph_limit: None,
        };
        let content = extract_page(&html, &unlimited).unwrap();
        assert_eq!(content.blocks.len(), 25);
    }

    #[test]
    fn test_container_is_not_truncated() {
        let paragraphs: String = (1..=25).map(|i| format!("<p>Paragraph {}</p>", i)).collect();
        let html = format!("<html><body><article>{}</article></body></html>", paragraphs);
        let content = extract_page(&html, &ExtractOptions::default()).unwrap();
        assert!(!content.used_fallback);
        assert_eq!(content.blocks.len(), 25);
    }

    #[test]
    fn test_chrome_is_excluded_from_blocks() {
        let html = r#"
            <html><head><title>Post</title><style>p { color: red }</style></head>
            <body>
              <header><h1>Site name</h1></header>
              <nav><ul><li><a href="/">Home</a></li></ul></nav>
              <main><h1>Real title</h1><p>Body text</p></main>
              <footer><p>Copyright</p></footer>
            </body></html>"#;
        let content = extract_page(html, &ExtractOptions::default()).unwrap();
        assert_eq!(content.title, "Post");
        assert_eq!(
            content.blocks,
            vec![
                ContentBlock::Heading { level: 1, html: "<h1>Real title</h1>".to_string() },
                ContentBlock::Paragraph { html: "<p>Body text</p>".to_string() },
            ]
        );
    }

    #[test]
    fn test_empty_document_is_a_parse_error() {
        let err = extract_page("  \n ", &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::Empty));
    }
}
