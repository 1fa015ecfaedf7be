//! HTTP fetcher implementation
//!
//! This module handles all outbound page requests for a crawl job:
//! - Building HTTP clients with the configured user agent
//! - Politeness pacing between the starts of consecutive fetches
//! - Bounding every fetch with a timeout and every body with a size cap
//! - Classifying outcomes so the job loop never sees an error value

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use url::Url;

/// Default cap on a downloaded page body
const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Page body; empty when the content type is not textual
    pub body: String,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page fetched with a 2xx status
    Success(FetchedPage),

    /// The request or body download exceeded the fetch timeout
    Timeout,

    /// Connection, TLS, DNS, redirect or body decoding failure
    NetworkError {
        /// Error description
        error: String,
    },

    /// The server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use clipcrawl::config::UserAgentConfig;
/// use clipcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Clipcrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues one request at a time with a minimum interval between starts
///
/// Pacing is global to the job, not per host, and applies after failures
/// too, so a run of bad URLs cannot turn into a burst of requests.
pub struct Fetcher {
    client: Client,
    delay: Duration,
    timeout: Duration,
    max_body_bytes: usize,
    last_started: Option<Instant>,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// * `delay` - minimum time between the starts of consecutive fetches
    /// * `timeout` - upper bound on one fetch including the body download
    pub fn new(client: Client, delay: Duration, timeout: Duration) -> Self {
        Self {
            client,
            delay,
            timeout,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            last_started: None,
        }
    }

    /// Overrides the body size cap; larger bodies resolve to `NetworkError`
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Fetches a URL, waiting out the politeness delay first
    pub async fn fetch(&mut self, url: &Url) -> FetchOutcome {
        self.wait_for_slot().await;

        let request = fetch_url(&self.client, url, self.max_body_bytes);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Timeout,
        }
    }

    async fn wait_for_slot(&mut self) {
        if let Some(last) = self.last_started {
            sleep_until(last + self.delay).await;
        }
        self.last_started = Some(Instant::now());
    }
}

/// Performs a single GET request and classifies the result
pub async fn fetch_url(client: &Client, url: &Url, max_body_bytes: usize) -> FetchOutcome {
    let mut response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_textual(&content_type) {
        tracing::debug!("Skipping body of {} ({})", url, content_type);
        return FetchOutcome::Success(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body: String::new(),
        });
    }

    if response.content_length().is_some_and(|len| len > max_body_bytes as u64) {
        return body_too_large(max_body_bytes);
    }

    let mut bytes = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if bytes.len() + chunk.len() > max_body_bytes {
                    return body_too_large(max_body_bytes);
                }
                bytes.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => return classify_error(e),
        }
    }

    FetchOutcome::Success(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn body_too_large(max_body_bytes: usize) -> FetchOutcome {
    FetchOutcome::NetworkError {
        error: format!("Response body exceeds {} bytes", max_body_bytes),
    }
}

fn classify_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkError {
            error: format!("Connection failed: {}", e),
        }
    } else {
        FetchOutcome::NetworkError {
            error: e.to_string(),
        }
    }
}

/// A missing Content-Type is treated as textual
fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/xhtml+xml"));
        assert!(is_textual(""));
        assert!(!is_textual("video/mp4"));
        assert!(!is_textual("image/png"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(2)).unwrap();
        let mut fetcher = Fetcher::new(client, Duration::ZERO, Duration::from_secs(2));

        // Port 9 (discard) is closed on loopback in test environments
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let outcome = fetcher.fetch(&url).await;

        assert!(matches!(
            outcome,
            FetchOutcome::NetworkError { .. } | FetchOutcome::Timeout
        ));
    }
}
