// src/export/mod.rs
// =============================================================================
// Flat CSV export of a crawl: one row per page with plain-text content.
//
// The block HTML is parsed again and only its text is kept, so the
// spreadsheet never sees tags or the email highlight markup.
//
// Extraction emits nested blocks too (a <p> inside a <ul> appears inside the
// list's Block and again as its own Paragraph). Only the outermost blocks
// feed the text column, so nothing is counted twice.
// =============================================================================

use crate::extract::collapse_whitespace;
use crate::model::{ContentBlock, CrawlResult, PageResult};
use scraper::Html;
use serde::Serialize;
use std::io::Write;

/// Default cap on the content column
pub const DEFAULT_MAX_CHARS: usize = 5000;

/// One CSV record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Word Count")]
    pub word_count: usize,
}

// Builds one row per extracted page, in crawl order
pub fn rows(result: &CrawlResult, max_chars: usize) -> Vec<ExportRow> {
    result
        .pages
        .iter()
        .map(|page| row(page, max_chars))
        .collect()
}

fn row(page: &PageResult, max_chars: usize) -> ExportRow {
    // Plain text of each top-level block, joined by single spaces
    let text = outermost(&page.blocks)
        .into_iter()
        .map(|block| block_text(block.html()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    ExportRow {
        url: page.url.clone(),
        title: page.title.clone(),
        // Counted on the full text, before truncation
        word_count: text.split_whitespace().count(),
        // chars(), not bytes: never cuts a multi-byte character in half
        content: text.chars().take(max_chars).collect(),
    }
}

// Drops blocks that sit inside an earlier list or blockquote
//
// Descendants always follow their container directly and in document order,
// and their sanitized markup is an exact slice of the container's markup.
// So each following block is looked up in the container's HTML after the
// previous descendant's start; the first one not found there is outside it.
fn outermost(blocks: &[ContentBlock]) -> Vec<&ContentBlock> {
    let mut kept = Vec::new();
    // The open container's markup and where the next descendant may start
    let mut open: Option<(&str, usize)> = None;

    for block in blocks {
        let html = block.html();

        if let Some((container, cursor)) = open.as_mut() {
            if let Some(pos) = container[*cursor..].find(html) {
                // every block starts with '<', so +1 stays on a char boundary
                *cursor += pos + 1;
                continue;
            }
        }

        open = match block {
            ContentBlock::Block { html } => Some((html.as_str(), 0)),
            _ => None,
        };
        kept.push(block);
    }

    kept
}

fn block_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

// Writes the header and every row
pub fn write_csv<W: Write>(rows: &[ExportRow], out: W) -> csv::Result<()> {
    // csv::Writer handles quoting (commas, quotes, newlines in content)
    let mut writer = csv::Writer::from_writer(out);
    if rows.is_empty() {
        // serialize() only emits the header along with the first record
        writer.write_record(["URL", "Title", "Content", "Word Count"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
