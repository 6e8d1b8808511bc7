//! Crawler module: the crawl engine
//!
//! This module contains the core crawling logic, including:
//! - The frontier state machine bounding a run
//! - The politeness rate limiter
//! - HTTP fetching with failure classification
//! - HTML content and link extraction
//! - The orchestrator that composes the above into one run

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod limiter;

pub use coordinator::{crawl, CrawlResult, Crawler};
pub use extractor::{extract_content, ExtractedContent};
pub use fetcher::{build_http_client, fetch_url, FetchFailure, FetchOutcome, MAX_REDIRECTS};
pub use frontier::{Admission, Frontier, FrontierEntry};
pub use limiter::RateLimiter;
