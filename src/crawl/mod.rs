// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - Stays inside the seed's domain (subdomains included)
// - Depth and page-count limits
// - Polite crawling with delays between requests
// - One shared browser session per crawl, only when a page needs rendering
//
// Entry points:
// - run_crawl: the whole job, browser lifetime included
// - scrape_page: fetch and extract a single URL, no link following
// =============================================================================

mod links;
mod queue;

pub use links::normalize_url;

use links::DomainScope;
use queue::crawl_website;

use crate::config::{CrawlConfig, CrawlJob, FetchSettings};
use crate::error::CrawlError;
use crate::fetch::{needs_browser, BrowserSession, Fetcher};
use crate::model::{CrawlResult, PageResult};
use tracing::info;

// Runs a complete crawl for `seed_url`
//
// The browser (if any) is started before the first fetch and shut down
// after the last one, whether the crawl succeeded or not.
pub async fn run_crawl(seed_url: &str, config: &CrawlConfig) -> Result<CrawlResult, CrawlError> {
    // Validation happens first: a bad seed never starts a browser
    let job = config.job(seed_url)?;

    // Failing to start the browser is fatal, with nothing to return
    let session = start_session(&job, &config.fetch).await?;

    // The fetcher borrows the session, so it must be gone before shutdown()
    // can take the session by value
    let outcome = match Fetcher::new(&config.fetch, session.as_ref()) {
        Ok(fetcher) => crawl_website(&job, &fetcher, config).await,
        Err(e) => Err(CrawlError::Resource {
            message: format!("failed to build HTTP client: {}", e),
            partial: None,
        }),
    };

    if let Some(session) = session {
        session.shutdown().await;
    }

    outcome
}

// Fetches and extracts one page
pub async fn scrape_page(url: &str, config: &CrawlConfig) -> Result<PageResult, CrawlError> {
    let job = config.job(url)?;
    let session = start_session(&job, &config.fetch).await?;

    let outcome = match Fetcher::new(&config.fetch, session.as_ref()) {
        Ok(fetcher) => {
            let scope = DomainScope::for_seed(job.seed());
            queue::process_page(&fetcher, job.seed(), &scope, &config.extract)
                .await
                .map(|page| PageResult {
                    url: job.seed().to_string(),
                    title: page.content.title,
                    blocks: page.content.blocks,
                    emails: page.content.emails,
                })
                .map_err(CrawlError::from)
        }
        Err(e) => Err(CrawlError::Resource {
            message: format!("failed to build HTTP client: {}", e),
            partial: None,
        }),
    };

    if let Some(session) = session {
        session.shutdown().await;
    }

    outcome
}

async fn start_session(
    job: &CrawlJob,
    settings: &FetchSettings,
) -> Result<Option<BrowserSession>, CrawlError> {
    if !needs_browser(settings.mode, job.seed()) {
        return Ok(None);
    }

    info!("{} needs JavaScript rendering, starting browser", job.seed());
    BrowserSession::launch(settings).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchMode;
    use std::path::PathBuf;
    use std::time::Duration;

    fn static_config() -> CrawlConfig {
        let mut config = CrawlConfig {
            request_delay: Duration::ZERO,
            ..CrawlConfig::default()
        };
        config.fetch.mode = FetchMode::Static;
        config
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_before_fetching() {
        let err = run_crawl("ftp://example.com/", &static_config())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));

        let err = scrape_page("not a url", &static_config()).await.unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));
    }

    // Rendered mode with a browser binary that does not exist
    fn missing_browser_config() -> CrawlConfig {
        let mut config = static_config();
        config.fetch.mode = FetchMode::Rendered;
        config.fetch.chrome_path = Some(PathBuf::from("/nonexistent/chrome"));
        config
    }

    #[tokio::test]
    async fn test_browser_launch_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = run_crawl(&server.url(), &missing_browser_config())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Resource { .. }), "got {:?}", err);
        assert!(err.partial().is_none());

        let err = scrape_page(&server.url(), &missing_browser_config())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Resource { .. }), "got {:?}", err);
        assert!(err.partial().is_none());

        // nothing was fetched, not even statically
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_crawl_static() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body(r#"<html><body><main><h2>Hi</h2></main><a href="/next">n</a></body></html>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/next")
            .with_header("content-type", "text/html")
            .with_body("<html><body><article><p>Next page</p></article></body></html>")
            .create_async()
            .await;

        let result = run_crawl(&server.url(), &static_config()).await.unwrap();

        assert_eq!(result.visited, 2);
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.seed_url, format!("{}/", server.url()));
    }

    #[tokio::test]
    async fn test_scrape_page_reports_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let err = scrape_page(&format!("{}/gone", server.url()), &static_config())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "page could not be scraped: HTTP 404");
    }

    #[tokio::test]
    async fn test_scrape_page_extracts_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/contact")
            .with_header("content-type", "text/html")
            .with_body(
                "<html><head><title>Contact</title></head><body><article><p>Mail team@corp.io</p></article></body></html>",
            )
            .create_async()
            .await;

        let page = scrape_page(&format!("{}/contact", server.url()), &static_config())
            .await
            .unwrap();

        assert_eq!(page.title, "Contact");
        assert_eq!(page.blocks.len(), 1);
        assert!(page.emails.contains("team@corp.io"));
    }
}
