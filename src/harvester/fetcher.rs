//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with browser-identifying headers
//! - GET requests with query parameters and a per-request timeout
//! - Error classification into timeout, status and transport failures

use crate::HarvestError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36 Edg/114.0.1823.82";

const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "sec-ch-ua",
        "\"Not.A/Brand\";v=\"8\", \"Chromium\";v=\"114\", \"Microsoft Edge\";v=\"114\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "Windows"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
];

/// Returns the headers attached to every request
///
/// hh.ru serves a stripped page to clients that do not look like a browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    for &(name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Builds an HTTP client with browser headers and the given request timeout
///
/// # Example
///
/// ```no_run
/// use hh_harvester::harvester::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the response body as text
///
/// # Error classification
///
/// | Condition | Error |
/// |-----------|-------|
/// | Request or body read timed out | `HarvestError::Timeout` |
/// | Non-2xx status | `HarvestError::Status` |
/// | Any other client failure | `HarvestError::Transport` |
///
/// Retrying is left to the caller.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, HarvestError> {
    let request = client
        .get(url)
        .query(query)
        .build()
        .map_err(|e| classify(url, e))?;
    let full_url = request.url().to_string();

    tracing::debug!("GET {}", full_url);

    let response = client
        .execute(request)
        .await
        .map_err(|e| classify(&full_url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Status {
            url: full_url,
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify(&full_url, e))
}

/// Maps a reqwest failure onto the harvester's error taxonomy
fn classify(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}
