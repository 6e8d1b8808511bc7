//! Crawl orchestrator - the main crawl loop
//!
//! Drives one run: dequeue a URL from the frontier, wait out the politeness
//! delay, fetch, extract, persist, feed discovered links back into the
//! frontier. Every per-page failure is absorbed into the run's counters;
//! only an invalid configuration can prevent a run from producing a
//! [`CrawlResult`].

use crate::config::Config;
use crate::crawler::extractor::extract_content;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchOutcome};
use crate::crawler::frontier::{Admission, Frontier, FrontierEntry};
use crate::crawler::limiter::RateLimiter;
use crate::storage::{CrawledPage, PageStore, SqliteStore};
use crate::url::normalize_url;
use crate::KumoError;
use reqwest::Client;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything one crawl run produced
///
/// Run-scoped: dropped at the end of the run unless exported.
#[derive(Debug, Default)]
pub struct CrawlResult {
    /// Pages in the order they were processed
    pub pages: Vec<CrawledPage>,

    /// Pages fetched successfully (including non-HTML responses)
    pub pages_fetched: u64,

    /// Pages whose fetch failed (timeout, connection, redirects, bad status)
    pub pages_failed: u64,

    /// Discovered links dropped because their URL was already known
    pub duplicate_links_skipped: u64,

    /// Pages that could not be persisted (storage errors are recoverable)
    pub pages_unsaved: u64,
}

impl CrawlResult {
    /// Total pages processed, successful or not
    pub fn pages_processed(&self) -> u64 {
        self.pages_fetched + self.pages_failed
    }
}

/// The crawl orchestrator
pub struct Crawler {
    client: Client,
    limiter: RateLimiter,
    frontier: Frontier,
    store: Option<SqliteStore>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler from a validated configuration
    ///
    /// Opens the configured database when storage is enabled and seeds the
    /// frontier; a seed that fails normalization is a configuration-level
    /// problem and fails construction.
    pub fn new(config: Config) -> Result<Self, KumoError> {
        let store = if config.storage.enabled {
            Some(SqliteStore::open(Path::new(&config.storage.database_path))?)
        } else {
            None
        };
        Self::with_store(config, store)
    }

    /// Creates a crawler with an injected store (or none)
    pub fn with_store(config: Config, store: Option<SqliteStore>) -> Result<Self, KumoError> {
        let client = build_http_client(&config.crawler)?;
        let limiter = RateLimiter::from_secs_f64(config.crawler.delay_seconds);
        let mut frontier = Frontier::new(config.crawler.max_pages, config.crawler.max_depth);

        for seed in &config.seeds {
            let url = normalize_url(seed)?;
            frontier.enqueue(url, 0);
        }

        Ok(Self {
            client,
            limiter,
            frontier,
            store,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the cancellation token (e.g. one shared with a signal handler)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A clone of the token that cancels this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion
    ///
    /// Terminates when the frontier is drained, the page budget is spent, or
    /// cancellation is requested. Cancellation takes effect at the next
    /// dequeue boundary; the in-flight page always finishes and its result
    /// is still recorded.
    pub async fn run(&mut self) -> Result<CrawlResult, KumoError> {
        let mut result = CrawlResult::default();
        let started = std::time::Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancellation requested, stopping at the frontier boundary");
                break;
            }

            let entry = match self.frontier.next() {
                Some(entry) => entry,
                None => break,
            };

            self.limiter.wait().await;
            self.process_entry(&entry, &mut result).await;
            self.frontier.complete(&entry.url);

            let processed = result.pages_processed();
            if processed > 0 && processed % 10 == 0 {
                let rate = processed as f64 / started.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages processed, {} pending, {:.2} pages/sec",
                    processed,
                    self.frontier.pending_len(),
                    rate
                );
            }
        }

        tracing::info!(
            "Crawl completed: {} fetched, {} failed, {} visited in {:?}",
            result.pages_fetched,
            result.pages_failed,
            self.frontier.visited_len(),
            started.elapsed()
        );

        Ok(result)
    }

    /// Processes one frontier entry: fetch, extract, persist, discover
    async fn process_entry(&mut self, entry: &FrontierEntry, result: &mut CrawlResult) {
        tracing::info!("Crawling: {}", entry.url);

        let outcome = fetch_url(&self.client, &entry.url).await;

        let (page, links) = self.build_page(entry, outcome, result);

        if let Some(store) = self.store.as_mut() {
            match store.upsert_page(&page) {
                Ok(upsert) => {
                    tracing::debug!("Persisted {} ({:?})", page.url, upsert);
                }
                Err(e) => {
                    // Recoverable: the page stays in the run result as unsaved
                    tracing::error!("Failed to persist {}: {}", page.url, e);
                    result.pages_unsaved += 1;
                }
            }
        }

        for link in links {
            if self.frontier.enqueue(link, entry.depth + 1) == Admission::Duplicate {
                result.duplicate_links_skipped += 1;
            }
        }

        result.pages.push(page);
    }

    /// Turns a fetch outcome into a page record plus discovered links
    fn build_page(
        &self,
        entry: &FrontierEntry,
        outcome: FetchOutcome,
        result: &mut CrawlResult,
    ) -> (CrawledPage, Vec<Url>) {
        match outcome {
            FetchOutcome::Html {
                status_code,
                body,
                content_length,
                elapsed,
            } => {
                let content = extract_content(&body, &entry.url);
                tracing::debug!(
                    "Fetched {} ({} bytes, {} links, {:?})",
                    entry.url,
                    content_length,
                    content.links.len(),
                    elapsed
                );

                let mut links = Vec::with_capacity(content.links.len());
                for link in content.links {
                    match normalize_url(link.as_str()) {
                        Ok(normalized) => links.push(normalized),
                        Err(e) => tracing::debug!("Dropping link {}: {}", link, e),
                    }
                }

                result.pages_fetched += 1;
                let page = CrawledPage {
                    url: entry.url.as_str().to_string(),
                    title: content.title,
                    description: content.description,
                    text: content.text,
                    html: body,
                    status_code,
                    content_length,
                };
                (page, links)
            }

            FetchOutcome::NonHtml {
                status_code,
                content_type,
                content_length,
                ..
            } => {
                tracing::debug!("Non-HTML content at {} ({})", entry.url, content_type);
                result.pages_fetched += 1;
                let page = CrawledPage {
                    url: entry.url.as_str().to_string(),
                    status_code,
                    content_length,
                    ..CrawledPage::empty()
                };
                (page, Vec::new())
            }

            FetchOutcome::Failed {
                status_code,
                failure,
            } => {
                tracing::warn!("Fetch failed for {}: {:?}", entry.url, failure);
                result.pages_failed += 1;
                let page = CrawledPage {
                    url: entry.url.as_str().to_string(),
                    status_code,
                    ..CrawledPage::empty()
                };
                (page, Vec::new())
            }
        }
    }
}

/// Runs a complete crawl from a configuration
///
/// Convenience entry point for callers that do not need cancellation or an
/// injected store.
pub async fn crawl(config: Config) -> Result<CrawlResult, KumoError> {
    let mut crawler = Crawler::new(config)?;
    crawler.run().await
}
