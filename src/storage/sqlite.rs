//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::config::CrawlTarget;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ArchiveRecord, FrontierEntry, NewArchiveRecord, RunCounters, RunRecord, RunStatus,
    TargetRecord,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

const TARGET_COLUMNS: &str = "id, domain, url, block_selector, link_selector, title_selector,
     body_selector, updated_at_selector, remove_class_selector";

const RUN_COLUMNS: &str = "id, target_id, started_at, finished_at, config_hash, status,
     links_enqueued, articles_archived, items_failed";

/// SQLite storage backend
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and initializes the schema
    pub fn open(path: &Path, busy_timeout: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

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

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection, used by tests to inject failures
    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn target_from_row(row: &Row) -> rusqlite::Result<TargetRecord> {
    Ok(TargetRecord {
        id: row.get(0)?,
        target: CrawlTarget {
            domain: row.get(1)?,
            url: row.get(2)?,
            block: row.get(3)?,
            article_link: row.get(4)?,
            title: row.get(5)?,
            body: row.get(6)?,
            article_updated_at: row.get(7)?,
            remove_class: row.get(8)?,
        },
    })
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        target_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
        counters: RunCounters {
            links_enqueued: row.get::<_, i64>(6)? as u64,
            articles_archived: row.get::<_, i64>(7)? as u64,
            items_failed: row.get::<_, i64>(8)? as u64,
        },
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<FrontierEntry> {
    Ok(FrontierEntry {
        id: row.get(0)?,
        target_id: row.get(1)?,
        url: row.get(2)?,
        discovered_at: row.get(3)?,
        discovered_run: row.get(4)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Crawl Targets =====

    fn upsert_target(&mut self, target: &CrawlTarget) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_targets (domain, url, block_selector, link_selector, title_selector,
             body_selector, updated_at_selector, remove_class_selector, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(domain) DO UPDATE SET
                url = excluded.url,
                block_selector = excluded.block_selector,
                link_selector = excluded.link_selector,
                title_selector = excluded.title_selector,
                body_selector = excluded.body_selector,
                updated_at_selector = excluded.updated_at_selector,
                remove_class_selector = excluded.remove_class_selector,
                updated_at = excluded.updated_at",
            params![
                target.domain,
                target.url,
                target.block,
                target.article_link,
                target.title,
                target.body,
                target.article_updated_at,
                target.remove_class,
                now
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM crawl_targets WHERE domain = ?1",
            params![target.domain],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_target_by_domain(&self, domain: &str) -> StorageResult<Option<TargetRecord>> {
        let target = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawl_targets WHERE domain = ?1", TARGET_COLUMNS),
                params![domain],
                target_from_row,
            )
            .optional()?;
        Ok(target)
    }

    fn list_targets(&self) -> StorageResult<Vec<TargetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_targets ORDER BY domain",
            TARGET_COLUMNS
        ))?;

        let targets = stmt
            .query_map([], target_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(targets)
    }

    // ===== Run Management =====

    fn create_run(&mut self, target_id: i64, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (target_id, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                target_id,
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: RunCounters,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, links_enqueued = ?3,
             articles_archived = ?4, items_failed = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                counters.links_enqueued as i64,
                counters.articles_archived as i64,
                counters.items_failed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn recent_runs(&self, target_id: i64, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs WHERE target_id = ?1 ORDER BY id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![target_id, limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    // ===== Frontier =====

    fn frontier_contains(&self, target_id: i64, url: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM frontier WHERE target_id = ?1 AND url = ?2",
            params![target_id, url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn enqueue(&mut self, target_id: i64, url: &str, run_id: Option<i64>) -> StorageResult<bool> {
        if self.frontier_contains(target_id, url)? {
            return Ok(false);
        }

        // UNIQUE(target_id, url) still guards writers outside this process
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO frontier (target_id, url, discovered_at, discovered_run)
             VALUES (?1, ?2, ?3, ?4)",
            params![target_id, url, now, run_id],
        )?;

        Ok(inserted == 1)
    }

    fn dequeue_batch(&self, target_id: i64, limit: usize) -> StorageResult<Vec<FrontierEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_id, url, discovered_at, discovered_run FROM frontier
             WHERE target_id = ?1 ORDER BY id ASC LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![target_id, limit as i64], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn find_entry(&self, target_id: i64, url: &str) -> StorageResult<Option<FrontierEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, target_id, url, discovered_at, discovered_run FROM frontier
                 WHERE target_id = ?1 AND url = ?2",
                params![target_id, url],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn retire(&mut self, entry_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM frontier WHERE id = ?1", params![entry_id])?;
        Ok(())
    }

    fn count_frontier(&self, target_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM frontier WHERE target_id = ?1",
            params![target_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Archive =====

    fn store_article(&mut self, record: &NewArchiveRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO articles (target_id, url, title, body, article_updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.target_id,
                record.url,
                record.title,
                record.body,
                record.article_updated_at,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn is_archived(&self, target_id: i64, url: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE target_id = ?1 AND url = ?2",
            params![target_id, url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_archived(&self, target_id: i64, url: &str) -> StorageResult<Option<ArchiveRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, target_id, url, title, body, article_updated_at, created_at
                 FROM articles WHERE target_id = ?1 AND url = ?2 ORDER BY id DESC LIMIT 1",
                params![target_id, url],
                |row| {
                    Ok(ArchiveRecord {
                        id: row.get(0)?,
                        target_id: row.get(1)?,
                        url: row.get(2)?,
                        title: row.get(3)?,
                        body: row.get(4)?,
                        article_updated_at: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn count_articles(&self, target_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE target_id = ?1",
            params![target_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
