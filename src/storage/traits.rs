//! Storage trait and error types

use crate::storage::{CrawledPage, PageRecord, StoreStats, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// During a crawl run these are recoverable per page; only the management
/// CLI treats them as terminal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page storage backends
///
/// Defines the persistence contract the crawl engine and the management
/// tooling operate against.
pub trait PageStore {
    /// Inserts or updates a page, keyed on its canonical URL
    ///
    /// Insert sets created_at and updated_at to now; update touches the
    /// content fields and updated_at only, never the original created_at.
    fn upsert_page(&mut self, page: &CrawledPage) -> StorageResult<UpsertOutcome>;

    /// Gets a page by its canonical URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists pages by recency (most recently created first)
    fn list_pages(&self, limit: usize, offset: usize) -> StorageResult<Vec<PageRecord>>;

    /// Case-insensitive substring search over URL, title, and text content
    fn search_pages(&self, query: &str) -> StorageResult<Vec<PageRecord>>;

    /// Total number of stored pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Aggregate statistics over the stored pages
    fn stats(&self) -> StorageResult<StoreStats>;

    /// Deletes all stored pages, returning how many were removed
    fn clear(&mut self) -> StorageResult<u64>;
}
