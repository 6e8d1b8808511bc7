//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageResult};
use crate::storage::{CrawledPage, PageRecord, StoreStats, UpsertOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "id, url, title, description, text_content, html_content, \
     status_code, content_length, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database at the given path
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (used by tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            text_content: row.get(4)?,
            html_content: row.get(5)?,
            status_code: row.get(6)?,
            content_length: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl PageStore for SqliteStore {
    fn upsert_page(&mut self, page: &CrawledPage) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM crawled_pages WHERE url = ?1",
                params![page.url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE crawled_pages
                 SET title = ?1, description = ?2, text_content = ?3, html_content = ?4,
                     status_code = ?5, content_length = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    page.title,
                    page.description,
                    page.text,
                    page.html,
                    page.status_code,
                    page.content_length,
                    now,
                    id
                ],
            )?;
            Ok(UpsertOutcome::Updated)
        } else {
            self.conn.execute(
                "INSERT INTO crawled_pages
                 (url, title, description, text_content, html_content,
                  status_code, content_length, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    page.url,
                    page.title,
                    page.description,
                    page.text,
                    page.html,
                    page.status_code,
                    page.content_length,
                    now,
                    now
                ],
            )?;
            Ok(UpsertOutcome::Inserted)
        }
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawled_pages WHERE url = ?1",
            RECORD_COLUMNS
        ))?;

        let record = stmt
            .query_row(params![url], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    fn list_pages(&self, limit: usize, offset: usize) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawled_pages ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn search_pages(&self, query: &str) -> StorageResult<Vec<PageRecord>> {
        let pattern = format!("%{}%", query);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawled_pages
             WHERE url LIKE ?1 OR title LIKE ?1 OR text_content LIKE ?1
             ORDER BY created_at DESC, id DESC",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![pattern], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crawled_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn stats(&self) -> StorageResult<StoreStats> {
        let (total_pages, total_content_length): (i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(content_length) FROM crawled_pages",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let last_crawled_at: Option<String> = self.conn.query_row(
            "SELECT MAX(updated_at) FROM crawled_pages",
            [],
            |row| row.get(0),
        )?;

        let total_pages = total_pages as u64;
        let total_content_length = total_content_length.unwrap_or(0) as u64;
        let average_content_length = if total_pages > 0 {
            total_content_length as f64 / total_pages as f64
        } else {
            0.0
        };

        Ok(StoreStats {
            total_pages,
            total_content_length,
            average_content_length,
            last_crawled_at,
        })
    }

    fn clear(&mut self) -> StorageResult<u64> {
        let deleted = self.conn.execute("DELETE FROM crawled_pages", [])?;
        Ok(deleted as u64)
    }
}
