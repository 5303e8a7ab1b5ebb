// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, so stdout stays clean for JSON/CSV)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = content extracted, 1 = nothing extracted,
//    2 = error)
// =============================================================================

mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - crawl settings and job validation
mod crawl; // src/crawl/ - BFS crawl and link handling
mod error; // src/error.rs - typed errors
mod export; // src/export/ - CSV output
mod extract; // src/extract/ - content location and sanitizing
mod fetch; // src/fetch/ - static and rendered page fetching
mod model; // src/model.rs - result types

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::CrawlConfig;
use model::{CrawlResult, PageResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

// Returns:
//   Ok(0) = at least one page had content
//   Ok(1) = finished, but nothing was extracted
//   Err   = validation, browser or I/O failure (exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    let config = cli.command.config();

    match cli.command {
        Commands::Crawl {
            url, json, output, ..
        } => handle_crawl(&url, &config, json, output.as_deref()).await,
        Commands::Scrape { url, json, .. } => handle_scrape(&url, &config, json).await,
        Commands::Export {
            url,
            max_chars,
            output,
            ..
        } => handle_export(&url, &config, max_chars, output.as_deref()).await,
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    url: &str,
    config: &CrawlConfig,
    json: bool,
    output: Option<&Path>,
) -> Result<i32> {
    let result = crawl_or_report_partial(url, config, output).await?;

    if let Some(path) = output {
        write_json(&result, path)?;
    }

    // stdout gets only the result; notices go to stderr
    report_crawl(&result, json, output, &mut io::stdout().lock(), &mut io::stderr())?;

    Ok(exit_code(result.pages.len()))
}

// Writes a finished crawl: JSON or the summary table to `out`, and the
// "saved to" notice to `notices`
fn report_crawl(
    result: &CrawlResult,
    json: bool,
    saved_to: Option<&Path>,
    out: &mut impl Write,
    notices: &mut impl Write,
) -> Result<()> {
    if let Some(path) = saved_to {
        writeln!(notices, "💾 Results written to {}", path.display())?;
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, result)?;
        writeln!(out)?;
    } else {
        write_summary(out, result)?;
    }
    Ok(())
}

// Handles the 'scrape' subcommand
async fn handle_scrape(url: &str, config: &CrawlConfig, json: bool) -> Result<i32> {
    let page = crawl::scrape_page(url, config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(&page);
    }

    Ok(exit_code(usize::from(!page.blocks.is_empty())))
}

// Handles the 'export' subcommand
async fn handle_export(
    url: &str,
    config: &CrawlConfig,
    max_chars: usize,
    output: Option<&Path>,
) -> Result<i32> {
    let result = crawl_or_report_partial(url, config, None).await?;
    let rows = export::rows(&result, max_chars);

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            export::write_csv(&rows, BufWriter::new(file))?;
            eprintln!("💾 {} row(s) written to {}", rows.len(), path.display());
        }
        None => export::write_csv(&rows, io::stdout().lock())?,
    }

    Ok(exit_code(rows.len()))
}

// Runs the crawl. When the browser dies mid-crawl, whatever was collected is
// summarised (and saved, if asked) before the error is returned.
async fn crawl_or_report_partial(
    url: &str,
    config: &CrawlConfig,
    output: Option<&Path>,
) -> Result<CrawlResult> {
    match crawl::run_crawl(url, config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if let Some(partial) = e.partial() {
                // stderr, so a --json or CSV stdout is never mixed with it
                let mut stderr = io::stderr();
                writeln!(stderr, "⚠️  Crawl stopped early, partial results:")?;
                write_summary(&mut stderr, partial)?;
                if let Some(path) = output {
                    write_json(partial, path)?;
                }
            }
            Err(anyhow::Error::new(e).context(describe(url)))
        }
    }
}

fn describe(url: &str) -> String {
    format!("crawl of {} failed", url)
}

fn write_json(result: &CrawlResult, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

fn exit_code(pages_with_content: usize) -> i32 {
    if pages_with_content > 0 {
        0
    } else {
        1
    }
}

// Writes a human-readable overview of a crawl
fn write_summary(out: &mut impl Write, result: &CrawlResult) -> io::Result<()> {
    // Table header
    writeln!(out, "🔍 Crawled from {}", result.seed_url)?;
    writeln!(out)?;
    writeln!(out, "{:<70} {:>7} {:<30}", "URL", "BLOCKS", "TITLE")?;
    writeln!(out, "{}", "=".repeat(109))?;

    // One line per page that had content
    for page in &result.pages {
        writeln!(
            out,
            "{:<70} {:>7} {:<30}",
            truncate(&page.url, 67),
            page.blocks.len(),
            truncate(&page.title, 27)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "   📄 Visited: {}", result.visited)?;
    writeln!(out, "   ✅ With content: {}", result.pages.len())?;
    writeln!(out, "   ❌ Failed: {}", result.failures.len())?;
    writeln!(out, "   🔗 Unique links: {}", result.total_links)?;

    // Failed pages are listed so they can be retried by hand
    for failure in &result.failures {
        writeln!(out, "      {} ({})", failure.url, failure.error)?;
    }
    Ok(())
}

fn print_page(page: &PageResult) {
    println!("📄 {}", page.title);
    println!("   {}", page.url);
    println!("   {} block(s)", page.blocks.len());
    if !page.emails.is_empty() {
        let emails: Vec<&str> = page.emails.iter().map(String::as_str).collect();
        println!("   ✉️  {}", emails.join(", "));
    }
}

// Shortens text for table display without splitting a character
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use crate::model::FailedPage;

    fn sample_result() -> CrawlResult {
        CrawlResult {
            seed_url: "https://site.com/".to_string(),
            total_links: 1,
            links: vec!["https://site.com/a".to_string()],
            pages: Vec::new(),
            visited: 2,
            failures: vec![FailedPage {
                url: "https://site.com/a".to_string(),
                error: "HTTP 500".to_string(),
            }],
        }
    }

    #[test]
    fn test_json_stdout_stays_parseable_when_saving() {
        let mut out = Vec::new();
        let mut notices = Vec::new();
        report_crawl(
            &sample_result(),
            true,
            Some(Path::new("/tmp/result.json")),
            &mut out,
            &mut notices,
        )
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["seed_url"], "https://site.com/");
        let notices = String::from_utf8(notices).unwrap();
        assert!(notices.contains("/tmp/result.json"));
    }

    #[test]
    fn test_summary_goes_to_given_writer() {
        let mut out = Vec::new();
        let mut notices = Vec::new();
        report_crawl(&sample_result(), false, None, &mut out, &mut notices).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Visited: 2"));
        assert!(text.contains("https://site.com/a (HTTP 500)"));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(3), 0);
        assert_eq!(exit_code(0), 1);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_crawl_error_keeps_source_in_context() {
        let err = anyhow::Error::new(CrawlError::Validation("seed URL is missing".to_string()))
            .context(describe("https://x.com"));
        assert_eq!(
            format!("{:#}", err),
            "crawl of https://x.com failed: invalid crawl request: seed URL is missing"
        );
    }
}
