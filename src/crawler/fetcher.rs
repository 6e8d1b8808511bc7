//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with a fixed redirect cap
//! - Classifying failures so the crawl loop can record them and continue

use crate::config::CrawlerConfig;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Maximum redirect hops before a fetch fails with `RedirectLimit`
pub const MAX_REDIRECTS: usize = 5;

/// Result of fetching one URL
///
/// No variant is fatal to the crawl: every outcome becomes a recorded page.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A 2xx HTML response whose body goes to the extractor
    Html {
        status_code: u16,
        body: String,
        content_length: u64,
        elapsed: Duration,
    },

    /// A 2xx response with a non-HTML content type
    ///
    /// Recorded (status, length) but never handed to the extractor.
    NonHtml {
        status_code: u16,
        content_type: String,
        content_length: u64,
        elapsed: Duration,
    },

    /// The fetch failed; the page is recorded with the captured status
    ///
    /// Connection-level failures carry the sentinel status 0.
    Failed {
        status_code: u16,
        failure: FetchFailure,
    },
}

/// Classification of a fetch failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request exceeded the configured timeout
    Timeout,

    /// Connection refused, DNS failure, TLS failure
    Connection(String),

    /// The redirect chain exceeded `MAX_REDIRECTS`
    RedirectLimit,

    /// A non-2xx HTTP status
    HttpStatus,

    /// Anything else (body read failure, protocol error)
    Other(String),
}

impl FetchOutcome {
    /// The HTTP status captured for this outcome (0 for connection failures)
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Html { status_code, .. }
            | Self::NonHtml { status_code, .. }
            | Self::Failed { status_code, .. } => *status_code,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Builds the HTTP client used for the whole crawl run
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single URL and classifies the result
///
/// Redirects are followed by the client up to `MAX_REDIRECTS`; a longer
/// chain surfaces as `FetchFailure::RedirectLimit`. Non-2xx statuses are
/// captured without reading the body. Non-HTML bodies are downloaded only
/// to measure their length.
pub async fn fetch_url(client: &Client, url: &Url) -> FetchOutcome {
    let started = Instant::now();

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_send_error(&e),
    };

    let status_code = response.status().as_u16();

    if !response.status().is_success() {
        return FetchOutcome::Failed {
            status_code,
            failure: FetchFailure::HttpStatus,
        };
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // A missing content type is treated as HTML; the extractor degrades
    // gracefully on anything that turns out not to be.
    let is_html = content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml");

    if !is_html {
        let content_length = match response.bytes().await {
            Ok(bytes) => bytes.len() as u64,
            Err(_) => 0,
        };
        return FetchOutcome::NonHtml {
            status_code,
            content_type,
            content_length,
            elapsed: started.elapsed(),
        };
    }

    match response.text().await {
        Ok(body) => {
            let content_length = body.len() as u64;
            FetchOutcome::Html {
                status_code,
                body,
                content_length,
                elapsed: started.elapsed(),
            }
        }
        Err(e) => FetchOutcome::Failed {
            status_code,
            failure: FetchFailure::Other(e.to_string()),
        },
    }
}

fn classify_send_error(e: &reqwest::Error) -> FetchOutcome {
    let failure = if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_redirect() {
        FetchFailure::RedirectLimit
    } else if e.is_connect() {
        FetchFailure::Connection(e.to_string())
    } else {
        FetchFailure::Other(e.to_string())
    };

    FetchOutcome::Failed {
        status_code: e.status().map(|s| s.as_u16()).unwrap_or(0),
        failure,
    }
}
