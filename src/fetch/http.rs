// src/fetch/http.rs
// =============================================================================
// Static fetch strategy: one HTTP GET per page.
//
// - Sends a desktop browser User-Agent (many sites block default clients)
// - Bounded timeout per request (10s by default)
// - Any non-2xx status is an error, as is a non-HTML Content-Type
// =============================================================================

use super::PageFetcher;
use crate::config::FetchSettings;
use crate::error::FetchError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

/// Plain HTTP fetcher. Cloning is cheap (the client is reference counted).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        // One client for the whole crawl: it pools connections per host
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.static_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            timeout_secs: settings.static_timeout.as_secs(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        // send() follows redirects (up to 10) before we see the response
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        // 2xx only; 404, 500 etc. become FetchError::Status
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Don't feed PDFs or images to the HTML parser
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html_content_type(content_type) {
                return Err(FetchError::UnsupportedContent(content_type.to_string()));
            }
        }

        // text() decodes using the charset from Content-Type (UTF-8 default)
        response.text().await.map_err(|e| self.classify(e))
    }
}

impl HttpFetcher {
    // Timeouts get their own variant so logs say which limit was hit
    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                operation: "request",
                seconds: self.timeout_secs,
            }
        } else {
            FetchError::Transport(error)
        }
    }
}

// text/html, application/xhtml+xml, and plain text are all worth parsing
fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime == "application/xhtml+xml"
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is a non-2xx status an error here?
//    - reqwest treats any response as success; the status is just a field
//    - Error pages (404, 500) would otherwise be extracted as content
//
// 2. What does map_err do?
//    - It converts the error inside a Result, leaving Ok values untouched
//    - Here reqwest::Error becomes our FetchError
// -----------------------------------------------------------------------------
