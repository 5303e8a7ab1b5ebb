// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Three subcommands:
// - crawl:  breadth-first crawl, JSON or a short summary
// - scrape: one page, no link following
// - export: crawl, then write one CSV row per page
// =============================================================================

use crate::config::{CrawlConfig, FetchMode, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use crate::export::DEFAULT_MAX_CHARS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "site-harvest",
    version,
    about = "Crawl a website and extract its readable content",
    long_about = "site-harvest crawls a website breadth-first, stays on the seed's domain, \
                  and pulls headings, paragraphs and images out of every page. \
                  JavaScript-heavy platforms are rendered in headless Chrome."
)]
pub struct Cli {
    /// Log debug details to stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from a URL
    ///
    /// Example: site-harvest crawl https://example.com --max-depth 1 --json
    Crawl {
        /// Seed URL (http or https)
        url: String,

        #[command(flatten)]
        limits: Limits,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Pause between page fetches, in milliseconds
        #[arg(long, default_value_t = 100)]
        delay_ms: u64,

        /// Keep every paragraph when falling back to <body>
        #[arg(long)]
        no_fallback_limit: bool,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Write the JSON result to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the content of a single page
    ///
    /// Example: site-harvest scrape https://example.com/about
    Scrape {
        url: String,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Print the page as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Crawl and export one CSV row per page
    ///
    /// Example: site-harvest export https://example.com -o pages.csv
    Export {
        url: String,

        #[command(flatten)]
        limits: Limits,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Truncate each page's text to this many characters
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,

        /// CSV destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Limits {
    /// Maximum link hops from the seed (0 = only the seed)
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// How pages are fetched: auto picks the browser for known JS-heavy sites
    #[arg(long, value_enum, default_value_t = FetchMode::Auto)]
    pub fetch_mode: FetchMode,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

impl FetchArgs {
    // Applies the fetch flags on top of the defaults
    pub fn apply(&self, config: &mut CrawlConfig) {
        config.fetch.mode = self.fetch_mode;
        config.fetch.headless = !self.headed;
    }
}

impl Limits {
    pub fn apply(&self, config: &mut CrawlConfig) {
        config.max_depth = self.max_depth;
        config.max_pages = self.max_pages;
    }
}

impl Commands {
    // Builds the crawl configuration for this invocation
    pub fn config(&self) -> CrawlConfig {
        let mut config = CrawlConfig::default();
        match self {
            Commands::Crawl {
                limits,
                fetch,
                delay_ms,
                no_fallback_limit,
                ..
            } => {
                limits.apply(&mut config);
                fetch.apply(&mut config);
                config.request_delay = Duration::from_millis(*delay_ms);
                if *no_fallback_limit {
                    config.extract.fallback_paragraph_limit = None;
                }
            }
            Commands::Scrape { fetch, .. } => fetch.apply(&mut config),
            Commands::Export { limits, fetch, .. } => {
                limits.apply(&mut config);
                fetch.apply(&mut config);
            }
        }
        config
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[command(flatten)] do?
//    - The fields of Limits/FetchArgs become flags of the subcommand
//    - crawl and export share them without repeating the definitions
//
// 2. What is ValueEnum?
//    - It lets clap parse "--fetch-mode static" straight into FetchMode
//    - Unknown values are rejected with a list of the valid ones
//
// 3. Why `global = true` on --verbose?
//    - A global flag may appear before or after the subcommand
// -----------------------------------------------------------------------------
