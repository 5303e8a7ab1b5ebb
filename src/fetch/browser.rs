// src/fetch/browser.rs
// =============================================================================
// Rendered fetch strategy: load the page in headless Chrome.
//
// BrowserSession is the one Chrome process shared by the whole crawl:
//   launch() once before the crawl loop, shutdown() once after it.
//
// Each fetch opens a fresh tab and always closes it again, even when the
// navigation fails. Inside the tab:
//   1. set user agent, viewport and extra headers
//   2. navigate (30s limit)
//   3. wait for the network to go quiet (15s, best effort; timing out is fine)
//   4. scroll to the bottom to trigger lazy loading
//   5. click a "load more" button if one is visible
//   6. scroll again, let things settle, read the final HTML
// =============================================================================

use super::PageFetcher;
use crate::config::FetchSettings;
use crate::error::{CrawlError, FetchError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use url::Url;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body ? document.body.scrollHeight : 0)";

// Reports load state and how many resources have been requested so far
const QUIET_PROBE: &str = r#"
    (function() {
        return {
            ready: document.readyState,
            resources: performance.getEntriesByType('resource').length
        };
    })()
"#;

// Clicks the first visible "load more" style control; returns whether it did
const CLICK_LOAD_MORE: &str = r#"
    (function() {
        const visible = el => !!el && el.offsetParent !== null;
        const byText = Array.from(document.querySelectorAll('button'))
            .find(el => /\b(load|show) more\b/i.test(el.innerText || '') && visible(el));
        const target = byText || ['.load-more', '[data-testid="load-more"]']
            .map(selector => document.querySelector(selector))
            .find(visible);
        if (!target) {
            return false;
        }
        target.click();
        return true;
    })()
"#;

// How long the resource count must stay flat to count as "idle"
const QUIET_WINDOW: Duration = Duration::from_millis(500);
const QUIET_POLL: Duration = Duration::from_millis(250);

const LAZY_LOAD_SETTLE: Duration = Duration::from_secs(1);
const LOAD_MORE_SETTLE: Duration = Duration::from_secs(1);
const FINAL_SETTLE: Duration = Duration::from_millis(500);

/// The shared headless browser for one crawl
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    // Starts Chrome. Failure here is fatal for the crawl (ResourceError).
    pub async fn launch(settings: &FetchSettings) -> Result<Self, CrawlError> {
        let resource_error = |message: String| CrawlError::Resource {
            message,
            partial: None,
        };

        // Launch flags: a normal-looking desktop window, no first-run UI
        let (width, height) = settings.viewport;
        let mut builder = BrowserConfig::builder()
            .request_timeout(settings.navigation_timeout)
            .window_size(width, height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = chrome_executable(settings) {
            info!("Using browser at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| resource_error(format!("invalid browser config: {}", e)))?;

        // launch() starts the Chrome process and opens the CDP websocket.
        // `handler` is the stream of messages coming back from Chrome.
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| resource_error(format!("failed to launch browser: {}", e)))?;

        // The CDP handler must be polled for the browser to make progress.
        // When the connection to Chrome drops, this task ends.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let message = e.to_string();
                    // chromiumoxide cannot decode every CDP event Chrome sends
                    if message.contains("data did not match any variant")
                        || message.contains("Failed to deserialize WS response")
                    {
                        trace!("Ignoring undecodable CDP message: {}", message);
                    } else {
                        error!("Browser handler error: {}", message);
                    }
                }
            }
            debug!("Browser handler finished");
        });

        info!("Browser session started");
        Ok(Self { browser, handler })
    }

    /// False once the connection to Chrome is gone
    pub fn is_alive(&self) -> bool {
        !self.handler.is_finished()
    }

    // Closes Chrome and waits for the process to exit
    pub async fn shutdown(mut self) {
        // Ask Chrome to quit, then reap the process so it can't linger
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        info!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process; the handler task would
        // otherwise linger until the runtime shuts down.
        self.handler.abort();
    }
}

// Explicit setting first, then $CHROMIUM_PATH; None lets chromiumoxide
// search the usual install locations.
fn chrome_executable(settings: &FetchSettings) -> Option<PathBuf> {
    if let Some(path) = &settings.chrome_path {
        return Some(path.clone());
    }

    let path = PathBuf::from(std::env::var_os("CHROMIUM_PATH")?);
    if path.exists() {
        Some(path)
    } else {
        warn!(
            "CHROMIUM_PATH points to a missing file: {}, falling back to auto-detection",
            path.display()
        );
        None
    }
}

/// Headers a real browser would send on a top-level navigation
pub fn extra_headers() -> serde_json::Value {
    serde_json::json!({
        "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        "Accept-Language": "en-US,en;q=0.5",
        "DNT": "1",
        "Upgrade-Insecure-Requests": "1",
    })
}

/// Fetches pages through a shared BrowserSession
pub struct RenderedFetcher<'s> {
    session: &'s BrowserSession,
    user_agent: String,
    viewport: (u32, u32),
    navigation_timeout: Duration,
    idle_timeout: Duration,
}

impl<'s> RenderedFetcher<'s> {
    pub fn new(session: &'s BrowserSession, settings: &FetchSettings) -> Self {
        Self {
            session,
            user_agent: settings.user_agent.clone(),
            viewport: settings.viewport,
            navigation_timeout: settings.navigation_timeout,
            idle_timeout: settings.idle_timeout,
        }
    }

    // Makes the tab look like a regular desktop browser
    async fn prepare(&self, page: &Page) -> Result<(), FetchError> {
        // Headless Chrome announces itself as "HeadlessChrome" by default
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await?;

        let (width, height) = self.viewport;
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(FetchError::Browser)?;
        page.execute(metrics).await?;

        page.execute(SetExtraHttpHeadersParams::new(Headers::new(extra_headers())))
            .await?;
        Ok(())
    }

    async fn render(&self, page: &Page, url: &Url) -> Result<String, FetchError> {
        self.prepare(page).await?;

        // timeout() wraps the future: Err(_) means the time ran out,
        // Ok(result) carries goto()'s own result
        match tokio::time::timeout(self.navigation_timeout, page.goto(url.as_str())).await {
            Ok(navigation) => {
                navigation?;
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    operation: "navigation",
                    seconds: self.navigation_timeout.as_secs(),
                })
            }
        }

        // Partial content is acceptable, so a page that never goes idle is
        // read as-is.
        if tokio::time::timeout(self.idle_timeout, wait_for_quiet(page))
            .await
            .is_err()
        {
            debug!(
                "{} did not go idle within {}s, continuing",
                url,
                self.idle_timeout.as_secs()
            );
        }

        // Lazy-loaded images and infinite lists load on scroll
        page.evaluate(SCROLL_TO_BOTTOM).await?;
        tokio::time::sleep(LAZY_LOAD_SETTLE).await;

        if click_load_more(page).await {
            debug!("Clicked a load-more control on {}", url);
            tokio::time::sleep(LOAD_MORE_SETTLE).await;
        }

        page.evaluate(SCROLL_TO_BOTTOM).await?;
        tokio::time::sleep(FINAL_SETTLE).await;

        // The DOM as it is now, after scripts ran (not the original source)
        Ok(page.content().await?)
    }
}

impl PageFetcher for RenderedFetcher<'_> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        // Fresh tab per page: no state leaks from one page to the next
        let page = self.session.browser.new_page("about:blank").await?;

        // Keep the result instead of using `?`, so the close below still runs
        let outcome = self.render(&page, url).await;

        // The tab is released on every path, success or not
        if let Err(e) = page.close().await {
            warn!("Failed to close tab for {}: {}", url, e);
        }

        outcome
    }

    fn is_available(&self) -> bool {
        self.session.is_alive()
    }
}

// Polls until the document is complete and no new resources were requested
// for QUIET_WINDOW. Never returns on a busy page; callers bound it with a
// timeout.
async fn wait_for_quiet(page: &Page) {
    let mut last_count = None;
    let mut stable_since = Instant::now();

    loop {
        // A failed probe just means "try again on the next poll"
        if let Ok(result) = page.evaluate(QUIET_PROBE).await {
            if let Ok(state) = result.into_value::<serde_json::Value>() {
                let ready = state.get("ready").and_then(|v| v.as_str()) == Some("complete");
                let count = state.get("resources").and_then(|v| v.as_u64());

                // Any new request restarts the quiet window
                if count != last_count {
                    last_count = count;
                    stable_since = Instant::now();
                } else if ready && stable_since.elapsed() >= QUIET_WINDOW {
                    return;
                }
            }
        }
        tokio::time::sleep(QUIET_POLL).await;
    }
}

// A missing button, or a click that throws, is not an error
async fn click_load_more(page: &Page) -> bool {
    match page.evaluate(CLICK_LOAD_MORE).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            debug!("Load-more probe failed: {}", e);
            false
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is CDP?
//    - The Chrome DevTools Protocol: JSON messages over a websocket
//    - chromiumoxide turns them into typed Rust calls (page.goto, evaluate)
//
// 2. Why spawn a task for the handler?
//    - Replies from Chrome only arrive while the handler stream is polled
//    - tokio::spawn keeps polling it in the background
//    - When Chrome dies the stream ends and the task finishes, which is how
//      is_alive() notices
//
// 3. Why `RenderedFetcher<'s>` with a lifetime?
//    - It borrows the session instead of owning it
//    - The compiler then guarantees no fetcher outlives the browser
//
// 4. Why close the tab on every path?
//    - Each open tab holds memory in Chrome
//    - Returning early with `?` would skip the close, so the result is
//      stored first and returned after page.close()
//
// 5. Why implement Drop?
//    - shutdown() is async and can't run from Drop
//    - Drop still aborts the handler task if shutdown() was never called
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_headers() {
        let headers = extra_headers();
        assert_eq!(headers["DNT"], "1");
        assert_eq!(headers["Accept-Language"], "en-US,en;q=0.5");
        assert!(headers["Accept"].as_str().unwrap().starts_with("text/html"));
    }

    #[test]
    fn test_explicit_chrome_path_wins() {
        let settings = FetchSettings {
            chrome_path: Some(PathBuf::from("/opt/chrome/chrome")),
            ..FetchSettings::default()
        };
        assert_eq!(
            chrome_executable(&settings),
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
    }

    #[test]
    fn test_scripts_cover_load_more_patterns() {
        assert!(CLICK_LOAD_MORE.contains(".load-more"));
        assert!(CLICK_LOAD_MORE.contains(r#"[data-testid="load-more"]"#));
        assert!(CLICK_LOAD_MORE.contains("offsetParent"));
        assert!(QUIET_PROBE.contains("readyState"));
    }
}
