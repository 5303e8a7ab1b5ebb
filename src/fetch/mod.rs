// src/fetch/mod.rs
// =============================================================================
// Getting a page's HTML.
//
// Two strategies share one contract (PageFetcher::fetch):
// - http: a plain GET with reqwest. Fast, but sees only server-side HTML.
// - browser: a headless Chrome tab. Slow, but sees what JavaScript renders.
//
// Fetcher routes each URL to one of them. In auto mode a short list of
// platforms known to render client-side gets the browser; everything else
// uses the plain GET.
// =============================================================================

mod browser;
mod http;

pub use browser::BrowserSession;

use browser::RenderedFetcher;
use http::HttpFetcher;

use crate::config::{FetchMode, FetchSettings};
use crate::error::FetchError;
use url::Url;

/// Hosts containing one of these need a real browser to show their content
pub const DYNAMIC_PLATFORMS: &[&str] = &[
    "medium.com",
    "substack.com",
    "dev.to",
    "twitter.com",
    "facebook.com",
];

/// Anything that can turn a URL into HTML.
///
/// The crawl loop only talks to this trait, so tests can drive it with a
/// scripted fetcher instead of the network.
pub trait PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;

    /// False once a shared resource behind the fetcher (the browser) is gone
    fn is_available(&self) -> bool {
        true
    }
}

/// How a single URL will be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Static,
    Rendered,
}

// True when the host is a known client-side-rendered platform
pub fn requires_rendering(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    DYNAMIC_PLATFORMS
        .iter()
        .any(|platform| host.contains(platform))
}

// Strategy for a URL under the configured mode
pub fn strategy_for(mode: FetchMode, url: &Url) -> FetchStrategy {
    match mode {
        FetchMode::Static => FetchStrategy::Static,
        FetchMode::Rendered => FetchStrategy::Rendered,
        FetchMode::Auto if requires_rendering(url) => FetchStrategy::Rendered,
        FetchMode::Auto => FetchStrategy::Static,
    }
}

// Whether a crawl from `seed` needs a browser at all
//
// Every in-scope host shares the seed's domain root, so in auto mode the
// seed decides for the whole crawl.
pub fn needs_browser(mode: FetchMode, seed: &Url) -> bool {
    strategy_for(mode, seed) == FetchStrategy::Rendered
}

/// Routes each URL to the static or the rendered strategy
pub struct Fetcher<'s> {
    mode: FetchMode,
    http: HttpFetcher,
    rendered: Option<RenderedFetcher<'s>>,
}

impl<'s> Fetcher<'s> {
    pub fn new(settings: &FetchSettings, session: Option<&'s BrowserSession>) -> Result<Self, FetchError> {
        Ok(Self {
            mode: settings.mode,
            http: HttpFetcher::new(settings)?,
            rendered: session.map(|session| RenderedFetcher::new(session, settings)),
        })
    }
}

impl PageFetcher for Fetcher<'_> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        match (strategy_for(self.mode, url), &self.rendered) {
            (FetchStrategy::Rendered, Some(rendered)) => rendered.fetch(url).await,
            (FetchStrategy::Rendered, None) => {
                tracing::debug!("No browser session, fetching {} statically", url);
                self.http.fetch(url).await
            }
            (FetchStrategy::Static, _) => self.http.fetch(url).await,
        }
    }

    fn is_available(&self) -> bool {
        self.rendered
            .as_ref()
            .map_or(true, |rendered| rendered.is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_dynamic_platforms_need_rendering() {
        assert!(requires_rendering(&url("https://medium.com/@someone/post")));
        assert!(requires_rendering(&url("https://blog.Substack.com/p/x")));
        assert!(requires_rendering(&url("https://dev.to/user/article")));
        assert!(!requires_rendering(&url("https://example.com/medium")));
        assert!(!requires_rendering(&url("https://rust-lang.org/")));
    }

    #[test]
    fn test_strategy_respects_mode() {
        let medium = url("https://medium.com/");
        let plain = url("https://example.com/");

        assert_eq!(strategy_for(FetchMode::Auto, &medium), FetchStrategy::Rendered);
        assert_eq!(strategy_for(FetchMode::Auto, &plain), FetchStrategy::Static);
        assert_eq!(strategy_for(FetchMode::Static, &medium), FetchStrategy::Static);
        assert_eq!(strategy_for(FetchMode::Rendered, &plain), FetchStrategy::Rendered);

        assert!(needs_browser(FetchMode::Auto, &medium));
        assert!(!needs_browser(FetchMode::Auto, &plain));
    }

    #[test]
    fn test_fetcher_without_browser_is_available() {
        let settings = FetchSettings::default();
        let fetcher = Fetcher::new(&settings, None).unwrap();
        assert!(fetcher.is_available());
    }
}
