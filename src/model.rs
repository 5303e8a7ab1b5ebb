// src/model.rs
// =============================================================================
// Output types produced by a crawl.
//
// These are plain values: once a crawl returns them nothing mutates them
// again. They serialize to JSON with serde, e.g.
//
//   {"type": "heading", "level": 2, "html": "<h2>Intro</h2>"}
//   {"type": "image", "src": "/a.png", "alt": "A", "html": "<img ...>"}
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Title used when a page has neither <title> nor <h1>
pub const NO_TITLE: &str = "No Title";

/// One typed, sanitized unit of page content.
///
/// `#[serde(tag = "type")]` puts the variant name in a "type" field next to
/// the variant's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// <h1>..<h6>
    Heading { level: u8, html: String },
    /// <p> with non-blank text
    Paragraph { html: String },
    /// <img> with a src attribute
    Image { src: String, alt: String, html: String },
    /// <ul>, <ol> or <blockquote>, kept as one opaque unit
    Block { html: String },
}

impl ContentBlock {
    pub fn html(&self) -> &str {
        match self {
            ContentBlock::Heading { html, .. }
            | ContentBlock::Paragraph { html }
            | ContentBlock::Image { html, .. }
            | ContentBlock::Block { html } => html,
        }
    }
}

/// Extracted content of one crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub title: String,
    pub blocks: Vec<ContentBlock>,
    /// Email addresses found in the text of the blocks
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub emails: BTreeSet<String>,
}

/// A page that could not be fetched or parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPage {
    pub url: String,
    pub error: String,
}

/// Everything a crawl produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub seed_url: String,
    pub total_links: usize,
    /// Every in-scope link discovered, sorted
    pub links: Vec<String>,
    /// Pages with at least one content block, in crawl order
    pub pages: Vec<PageResult>,
    /// Number of URLs actually fetched (successfully or not)
    #[serde(default)]
    pub visited: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedPage>,
}
