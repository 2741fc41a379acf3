//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for article pages
//! - Error classification
//!
//! Fetch failures are soft: callers receive `None` from `fetch_page` and
//! decide for themselves whether a missing page is fatal.

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

/// Maximum redirect hops followed for a single page
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the request hit the configured timeout
        timed_out: bool,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent identification
/// * `fetcher` - Request timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use wikiscribe::config::{FetcherConfig, UserAgentConfig};
/// use wikiscribe::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "Wikiscribe".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetcher: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetcher.timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, any Content-Type | `Success` |
/// | Any other status | `HttpError` |
/// | Timeout, connection or body read failure | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return network_error(e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => network_error(e),
    }
}

/// Fetches a page body, logging and swallowing every kind of failure
///
/// # Returns
///
/// * `Some(String)` - The page HTML
/// * `None` - The page could not be fetched
pub async fn fetch_page(client: &Client, url: &str) -> Option<String> {
    match fetch_url(client, url).await {
        FetchResult::Success {
            final_url,
            status_code,
            body,
        } => {
            if final_url != url {
                tracing::debug!("{} redirected to {}", url, final_url);
            }
            tracing::debug!("Fetched {} ({}, {} bytes)", url, status_code, body.len());
            Some(body)
        }
        FetchResult::HttpError { status_code } => {
            tracing::warn!("Fetch of {} returned HTTP {}", url, status_code);
            None
        }
        FetchResult::NetworkError { error, timed_out } => {
            if timed_out {
                tracing::warn!("Fetch of {} timed out", url);
            } else {
                tracing::warn!("Fetch of {} failed: {}", url, error);
            }
            None
        }
    }
}

fn network_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
            timed_out: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}
