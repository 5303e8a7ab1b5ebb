// src/crawl/queue.rs
// =============================================================================
// The breadth-first crawl loop.
//
// How it works:
// 1. Start with the seed URL in a queue at depth 0
// 2. Pop the front of the queue, skip it if seen or too deep
// 3. Fetch the page, extract its content, discover its links
// 4. Queue new in-scope links at depth + 1 (while depth < max_depth)
// 5. Repeat until the queue is empty or max_pages URLs have been fetched
//
// A page that fails to fetch or parse is logged, recorded in `failures`,
// and skipped. It never stops the crawl. The only thing that does is losing
// the browser session, which every later rendered fetch would need.
//
// Rust concepts:
// - VecDeque: front pops keep the crawl breadth-first
// - Generics: crawl_website works with any PageFetcher, real or scripted
// =============================================================================

use super::links::{discover_links, DomainScope};
use crate::config::{CrawlConfig, CrawlJob, ExtractOptions};
use crate::error::{CrawlError, PageError, ParseError};
use crate::extract::{extract_document, PageContent};
use crate::fetch::PageFetcher;
use crate::model::{CrawlResult, FailedPage, PageResult};
use scraper::Html;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
struct CrawlItem {
    url: Url,
    depth: usize, // How many link hops from the seed
}

/// FIFO of pages still to fetch, plus an index of what is in it
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<CrawlItem>,
    queued: HashSet<String>,
}

impl Frontier {
    // Adds a URL to the back of the queue unless it is already waiting
    fn push(&mut self, url: Url, depth: usize) {
        // insert() returns false for a duplicate, so it doubles as the check
        if self.queued.insert(url.as_str().to_string()) {
            self.queue.push_back(CrawlItem { url, depth });
        }
    }

    // Takes the oldest entry: first in, first out = breadth-first
    fn pop(&mut self) -> Option<CrawlItem> {
        // `?` on an Option returns None early when the queue is empty
        let item = self.queue.pop_front()?;
        self.queued.remove(item.url.as_str());
        Some(item)
    }

    fn contains(&self, url: &Url) -> bool {
        self.queued.contains(url.as_str())
    }
}

/// A fetched page after parsing
#[derive(Debug)]
pub(crate) struct ProcessedPage {
    pub content: PageContent,
    pub links: Vec<Url>,
}

// Crawls a website starting from the job's seed
//
// Returns: every discovered link plus the content of every page that had
// any. Only a dead browser session makes this return an error; the error
// then carries the partial result.
pub async fn crawl_website<F: PageFetcher>(
    job: &CrawlJob,
    fetcher: &F,
    config: &CrawlConfig,
) -> Result<CrawlResult, CrawlError> {
    // Every discovered link is checked against the seed's domain root
    let scope = DomainScope::for_seed(job.seed());

    info!(
        "Starting crawl of {} (domain: {}, max_depth: {}, max_pages: {})",
        job.seed(),
        scope.root(),
        job.max_depth(),
        job.max_pages()
    );

    // Queue of pages to visit: the seed at depth 0
    let mut frontier = Frontier::default();
    frontier.push(job.seed().clone(), 0);

    // Track visited URLs so no page is fetched twice
    let mut visited: HashSet<String> = HashSet::new();
    // Every in-scope link seen on any page; BTreeSet keeps them sorted
    let mut links: BTreeSet<String> = BTreeSet::new();
    // Pages that produced at least one content block
    let mut pages: Vec<PageResult> = Vec::new();
    // Pages that could not be fetched or parsed
    let mut failures: Vec<FailedPage> = Vec::new();

    // visited counts fetch attempts, failed ones included
    while visited.len() < job.max_pages() {
        // Empty queue = nothing left to crawl
        let Some(item) = frontier.pop() else {
            break;
        };

        // Skip if already visited or deeper than allowed
        if visited.contains(item.url.as_str()) || item.depth > job.max_depth() {
            continue;
        }

        // Mark as visited before fetching, so a failure is never retried
        visited.insert(item.url.as_str().to_string());

        info!(
            "Crawling [{}/{}] depth {}: {}",
            visited.len(),
            job.max_pages(),
            item.depth,
            item.url
        );

        match process_page(fetcher, &item.url, &scope, &config.extract).await {
            Ok(ProcessedPage { content, links: page_links }) => {
                // Pages without content are not reported, but their links
                // are still followed below
                if content.blocks.is_empty() {
                    debug!("No content blocks on {}", item.url);
                } else {
                    pages.push(PageResult {
                        url: item.url.to_string(),
                        title: content.title,
                        blocks: content.blocks,
                        emails: content.emails,
                    });
                }

                for link in page_links {
                    links.insert(link.as_str().to_string());

                    // Only queue links we haven't seen and that are in range
                    if item.depth < job.max_depth()
                        && !visited.contains(link.as_str())
                        && !frontier.contains(&link)
                    {
                        frontier.push(link, item.depth + 1);
                    }
                }
            }
            Err(e) => {
                // Log the error but keep crawling other pages
                warn!("Error crawling {}: {}", item.url, e);
                failures.push(FailedPage {
                    url: item.url.to_string(),
                    error: e.to_string(),
                });

                // A dead browser would fail every remaining page, so stop
                // here and hand back what we have
                if !fetcher.is_available() {
                    let partial = finish(job, links, pages, visited.len(), failures);
                    return Err(CrawlError::Resource {
                        message: format!("browser session lost while fetching {}", item.url),
                        partial: Some(Box::new(partial)),
                    });
                }
            }
        }

        // Polite crawling: small delay between requests
        if !config.request_delay.is_zero() {
            tokio::time::sleep(config.request_delay).await;
        }
    }

    let result = finish(job, links, pages, visited.len(), failures);
    info!(
        "Crawl completed. Visited {} pages, discovered {} unique links, extracted content from {} pages.",
        result.visited,
        result.total_links,
        result.pages.len()
    );
    Ok(result)
}

// Fetches one page and parses it
pub(crate) async fn process_page<F: PageFetcher>(
    fetcher: &F,
    url: &Url,
    scope: &DomainScope,
    options: &ExtractOptions,
) -> Result<ProcessedPage, PageError> {
    // FetchError and ParseError both convert into PageError via `?`
    let html = fetcher.fetch(url).await?;
    Ok(parse_page(&html, url, scope, options)?)
}

// Links are collected before extraction strips navigation out of the tree.
// The parsed document never lives across an .await.
fn parse_page(
    html: &str,
    url: &Url,
    scope: &DomainScope,
    options: &ExtractOptions,
) -> Result<ProcessedPage, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    // html5ever never fails: broken markup is repaired, not rejected
    let mut document = Html::parse_document(html);

    // Order matters: extraction detaches <nav>, <header> etc. from the tree
    let links = discover_links(&document, url, scope);
    let content = extract_document(&mut document, options)?;

    Ok(ProcessedPage { content, links })
}

// Assembles the final (or partial) result
fn finish(
    job: &CrawlJob,
    links: BTreeSet<String>,
    pages: Vec<PageResult>,
    visited: usize,
    failures: Vec<FailedPage>,
) -> CrawlResult {
    CrawlResult {
        seed_url: job.seed().to_string(),
        total_links: links.len(),
        links: links.into_iter().collect(),
        pages,
        visited,
        failures,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is VecDeque?
//    - A double-ended queue: cheap push at the back, cheap pop at the front
//    - Vec::remove(0) would shift every element, VecDeque doesn't
//
// 2. Why BFS (breadth-first search)?
//    - BFS visits all pages at depth 1 before any page at depth 2
//    - With a page budget, the pages closest to the seed are crawled first
//
// 3. Why both `visited` and Frontier::queued?
//    - visited: pages already fetched (or attempted)
//    - queued: pages waiting in the queue
//    - Checking both keeps a URL from being queued twice
//
// 4. What does `F: PageFetcher` mean?
//    - crawl_website is generic: any type implementing PageFetcher works
//    - The real program passes a Fetcher, the tests pass a scripted one
//
// 5. Why Box<CrawlResult> in the error?
//    - A CrawlResult is large; boxing keeps the error type small
// -----------------------------------------------------------------------------
