//! Storage module for persisting crawled pages
//!
//! This module owns the durable page record: upserts keyed on canonical URL,
//! read/query operations for the management CLI and the API, and the SQLite
//! schema behind them.

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{PageStore, StorageError, StorageResult};

use serde::Serialize;

/// Transient page value produced by one crawl iteration
///
/// The orchestrator constructs this and hands it to the persistence adapter;
/// the durable form is [`PageRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct CrawledPage {
    /// Canonical URL (the storage uniqueness key)
    pub url: String,
    pub title: String,
    pub description: String,
    pub text: String,
    pub html: String,
    /// HTTP status code; 0 is the sentinel for connection-level failures
    pub status_code: u16,
    /// Body length in bytes
    pub content_length: u64,
}

impl CrawledPage {
    /// A page with empty content fields, for failed and non-HTML fetches
    pub fn empty() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            description: String::new(),
            text: String::new(),
            html: String::new(),
            status_code: 0,
            content_length: 0,
        }
    }
}

/// A persisted row from `crawled_pages`
///
/// Timestamps are RFC 3339 strings, which sort lexicographically in time
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub text_content: String,
    pub html_content: String,
    pub status_code: u16,
    pub content_length: u64,
    pub created_at: String,
    pub updated_at: String,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was created; created_at and updated_at were both set
    Inserted,
    /// An existing row was refreshed; created_at was left untouched
    Updated,
}

/// Aggregate statistics over the stored pages
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_pages: u64,
    pub total_content_length: u64,
    pub average_content_length: f64,
    /// updated_at of the most recently written row
    pub last_crawled_at: Option<String>,
}
