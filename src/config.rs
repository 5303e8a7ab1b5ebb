// src/config.rs
// =============================================================================
// Crawl configuration.
//
// - CrawlJob: the validated "what to crawl" (seed + limits). Built once per
//   crawl and never changed afterwards.
// - CrawlConfig: the "how to crawl" knobs (fetch strategy, timeouts, delays).
//
// cli.rs fills these in from command-line flags; everything has a default.
// =============================================================================

use crate::crawl::normalize_url;
use crate::error::CrawlError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Desktop Chrome user agent sent by both fetch strategies
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A validated crawl request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    seed: Url,
    max_depth: usize,
    max_pages: usize,
}

impl CrawlJob {
    // Validates the seed and limits
    //
    // Rejects (before anything is fetched):
    //   - empty or unparsable seed URLs
    //   - relative URLs ("/docs" has no base to resolve against)
    //   - schemes other than http/https
    //   - URLs without a host
    //   - max_pages == 0
    pub fn new(seed_url: &str, max_depth: usize, max_pages: usize) -> Result<Self, CrawlError> {
        let seed_url = seed_url.trim();
        if seed_url.is_empty() {
            return Err(CrawlError::Validation("seed URL is missing".to_string()));
        }

        let parsed = Url::parse(seed_url)
            .map_err(|e| CrawlError::Validation(format!("invalid URL '{}': {}", seed_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::Validation(format!(
                "URL must start with http:// or https://, got '{}'",
                seed_url
            )));
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(CrawlError::Validation(format!("URL has no host: {}", seed_url)));
        }

        if max_pages == 0 {
            return Err(CrawlError::Validation(
                "max_pages must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            seed: normalize_url(parsed),
            max_depth,
            max_pages,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// Which fetch strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Static fetch unless the host is a known dynamic platform
    #[default]
    Auto,
    /// Always plain HTTP GET
    Static,
    /// Always a headless browser
    Rendered,
}

/// Settings for both fetch strategies
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub mode: FetchMode,
    pub user_agent: String,
    pub static_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Best-effort wait for network idle; timing out is not an error
    pub idle_timeout: Duration,
    pub viewport: (u32, u32),
    pub headless: bool,
    /// Chrome/Chromium executable; falls back to $CHROMIUM_PATH, then auto-detection
    pub chrome_path: Option<PathBuf>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            mode: FetchMode::Auto,
            user_agent: BROWSER_USER_AGENT.to_string(),
            static_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(15),
            viewport: (1280, 720),
            headless: true,
            chrome_path: None,
        }
    }
}

/// Settings for content extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// When no content container matches and we fall back to <body>,
    /// keep at most this many paragraphs. None = no cap.
    pub fallback_paragraph_limit: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fallback_paragraph_limit: Some(20),
        }
    }
}

/// Everything that tunes a crawl besides the seed itself
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    /// Pause after each fetched page so we don't hammer the server
    pub request_delay: Duration,
    pub fetch: FetchSettings,
    pub extract: ExtractOptions,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            request_delay: Duration::from_millis(100),
            fetch: FetchSettings::default(),
            extract: ExtractOptions::default(),
        }
    }
}

impl CrawlConfig {
    /// Builds and validates the job for a seed URL
    pub fn job(&self, seed_url: &str) -> Result<CrawlJob, CrawlError> {
        CrawlJob::new(seed_url, self.max_depth, self.max_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_normalizes_seed() {
        let job = CrawlJob::new("https://example.com/docs#intro", 2, 10).unwrap();
        assert_eq!(job.seed().as_str(), "https://example.com/docs");
        assert_eq!(job.max_depth(), 2);
        assert_eq!(job.max_pages(), 10);
    }

    #[test]
    fn test_job_rejects_bad_seeds() {
        for seed in ["", "   ", "example.com", "/docs", "ftp://example.com/", "mailto:a@b.com"] {
            let err = CrawlJob::new(seed, 1, 10).unwrap_err();
            assert!(matches!(err, CrawlError::Validation(_)), "accepted {:?}", seed);
        }
    }

    #[test]
    fn test_job_rejects_zero_pages() {
        let err = CrawlJob::new("https://example.com", 1, 0).unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));
    }

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.fetch.mode, FetchMode::Auto);
        assert_eq!(config.fetch.static_timeout, Duration::from_secs(10));
        assert_eq!(config.extract.fallback_paragraph_limit, Some(20));
    }
}
