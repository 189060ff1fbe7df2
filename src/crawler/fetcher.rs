//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the fetch pool, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests returning the raw response bytes
//! - The rate-limit cooldown and single retry
//! - Error classification

use crate::config::UserAgentConfig;
use crate::url::SiteScope;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty if absent)
        content_type: String,
        /// Raw response body
        body: Vec<u8>,
    },

    /// Server answered 429 Too Many Requests
    RateLimited,

    /// Any other non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed only while they stay on the allowed hosts. A
/// redirect leaving them is not followed, and the 3xx answer is returned
/// as an HTTP error. The mirrored file is stored under the requested URL,
/// not the final one.
///
/// # Example
///
/// ```no_run
/// use fedlex_mirror::config::{SiteConfig, UserAgentConfig};
/// use fedlex_mirror::crawler::build_http_client;
/// use fedlex_mirror::SiteScope;
/// use std::time::Duration;
///
/// let config = UserAgentConfig::default();
/// let scope = SiteScope::from_config(&SiteConfig::default());
/// let client = build_http_client(&config, &scope, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    scope: &SiteScope,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .redirect(redirect_policy(scope.clone()))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Follows redirects that stay on the allowed hosts, up to `MAX_REDIRECTS`
fn redirect_policy(scope: SiteScope) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if scope.is_allowed_host(attempt.url()) {
            attempt.follow()
        } else {
            tracing::debug!("Not following redirect to {}: host not allowed", attempt.url());
            attempt.stop()
        }
    })
}

/// Fetches a URL once and classifies the outcome
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchResult::RateLimited;
    }
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match response.bytes().await {
        Ok(body) => FetchResult::Success {
            status_code: status.as_u16(),
            content_type,
            body: body.to_vec(),
        },
        Err(e) => classify_error(e),
    }
}

/// Fetches a URL, waiting out one 429 answer before a single retry
///
/// A second 429 is returned as-is and the caller abandons the URL.
pub async fn fetch_with_cooldown(client: &Client, url: &str, cooldown: Duration) -> FetchResult {
    match fetch_url(client, url).await {
        FetchResult::RateLimited => {
            tracing::warn!(
                "Rate limited on {}, cooling down for {}ms",
                url,
                cooldown.as_millis()
            );
            tokio::time::sleep(cooldown).await;
            fetch_url(client, url).await
        }
        other => other,
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
