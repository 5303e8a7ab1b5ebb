// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two levels:
// - Job-level errors (CrawlError) stop the whole crawl and reach the caller.
// - Page-level errors (PageError = FetchError | ParseError) are caught by the
//   crawl loop, recorded, and the loop moves on to the next URL.
//
// We use `thiserror` to derive Display/Error instead of writing the impls by
// hand. main.rs still uses anyhow::Result on top of these.
// =============================================================================

use crate::model::CrawlResult;
use thiserror::Error;

/// Errors that abort a crawl before or while it runs.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Bad seed URL or limits; raised before anything is fetched
    #[error("invalid crawl request: {0}")]
    Validation(String),

    /// The shared browser session could not be started, or died mid-crawl.
    /// `partial` holds whatever was gathered before the failure.
    #[error("browser session unavailable: {message}")]
    Resource {
        message: String,
        partial: Option<Box<CrawlResult>>,
    },

    /// Single-page scrape only: the one page we were asked for failed
    #[error("page could not be scraped: {0}")]
    Page(#[from] PageError),
}

impl CrawlError {
    /// Partial results attached to a resource failure, if any
    pub fn partial(&self) -> Option<&CrawlResult> {
        match self {
            CrawlError::Resource { partial, .. } => partial.as_deref(),
            CrawlError::Validation(_) | CrawlError::Page(_) => None,
        }
    }
}

/// Failure to retrieve one page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unsupported content type `{0}`")]
    UnsupportedContent(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser(err.to_string())
    }
}

/// Failure to make sense of a fetched page.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document has no <body> element")]
    MissingBody,

    #[error("document is empty")]
    Empty,
}

/// Anything that can go wrong with a single page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
