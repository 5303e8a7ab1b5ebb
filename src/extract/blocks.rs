// src/extract/blocks.rs
// =============================================================================
// Turns a content subtree into a list of ContentBlocks.
//
// We visit h1-h6, p, img, ul, ol and blockquote in document order. Nested
// matches are visited too: a <p> inside an <li> shows up both inside the
// list's Block and as its own Paragraph, exactly where it sits in the page.
// =============================================================================

use super::sanitize::{is_script_url, sanitize};
use crate::model::ContentBlock;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::BTreeSet;

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, img, ul, ol, blockquote")
        .expect("valid block selector")
});

/// Blocks of one page plus the (lowercased) emails found in them
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub blocks: Vec<ContentBlock>,
    pub emails: BTreeSet<String>,
}

// Extracts blocks under `root`
//
// `paragraph_limit` caps how many <p> elements are looked at (blank ones
// count too); everything else is unaffected.
pub fn extract_blocks(root: ElementRef<'_>, paragraph_limit: Option<usize>) -> Extracted {
    let mut extracted = Extracted::default();
    let mut paragraphs_seen = 0;

    // select() walks the subtree in document order, descendants included
    for element in root.select(&BLOCK_SELECTOR) {
        let name = element.value().name();
        let block = match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                // "h3" -> 3
                let Ok(level) = name[1..].parse::<u8>() else {
                    continue;
                };
                let sanitized = sanitize(element);
                extracted.add_emails(&sanitized.emails);
                ContentBlock::Heading {
                    level,
                    html: sanitized.html,
                }
            }
            "p" => {
                // Counted before the blank check, so blank ones use up the cap
                paragraphs_seen += 1;
                if paragraph_limit.is_some_and(|limit| paragraphs_seen > limit) {
                    continue;
                }

                // Blank is judged on what survives sanitizing: a <p> that
                // only held a <script> is empty once the script is dropped
                let sanitized = sanitize(element);
                if !sanitized.has_text {
                    continue;
                }
                extracted.add_emails(&sanitized.emails);
                ContentBlock::Paragraph {
                    html: sanitized.html,
                }
            }
            "img" => {
                // An image needs a usable src; javascript: sources are
                // stripped from the markup, so the image is skipped entirely
                let Some(src) = element
                    .value()
                    .attr("src")
                    .filter(|src| !src.trim().is_empty() && !is_script_url("src", src))
                else {
                    continue;
                };
                ContentBlock::Image {
                    src: src.to_string(),
                    alt: element.value().attr("alt").unwrap_or_default().to_string(),
                    html: sanitize(element).html,
                }
            }
            // ul, ol, blockquote
            _ => {
                let sanitized = sanitize(element);
                extracted.add_emails(&sanitized.emails);
                ContentBlock::Block {
                    html: sanitized.html,
                }
            }
        };
        extracted.blocks.push(block);
    }

    extracted
}

impl Extracted {
    fn add_emails(&mut self, emails: &[String]) {
        self.emails
            .extend(emails.iter().map(|email| email.to_lowercase()));
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one selector for every block type?
//    - A single select() keeps the blocks in page order
//    - Separate selects (all headings, then all paragraphs) would lose it
//
// 2. What does `paragraph_limit.is_some_and(...)` do?
//    - None means "no limit", so the closure never runs
//    - Some(20) runs the closure with 20
//
// 3. Why BTreeSet for emails?
//    - It removes duplicates and keeps the addresses sorted
//    - Sorted output makes JSON results stable between runs
// -----------------------------------------------------------------------------
