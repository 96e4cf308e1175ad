//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::config::CrawlTarget;
use crate::storage::{
    ArchiveRecord, FrontierEntry, NewArchiveRecord, RunCounters, RunRecord, RunStatus,
    TargetRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Crawl target not found: {0}")]
    TargetNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The frontier and archive sections are the only way crawl code mutates
/// the pending queue and the article archive.
pub trait Storage {
    // ===== Crawl Targets =====

    /// Inserts or updates a target keyed by its domain, returning its ID
    fn upsert_target(&mut self, target: &CrawlTarget) -> StorageResult<i64>;

    /// Looks up a stored target by domain
    fn get_target_by_domain(&self, domain: &str) -> StorageResult<Option<TargetRecord>>;

    /// Lists all stored targets ordered by domain
    fn list_targets(&self) -> StorageResult<Vec<TargetRecord>>;

    // ===== Run Management =====

    /// Creates a new running crawl run for a target
    fn create_run(&mut self, target_id: i64, config_hash: &str) -> StorageResult<i64>;

    /// Closes a run with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: RunCounters,
    ) -> StorageResult<()>;

    /// Gets the most recent runs for a target, newest first
    fn recent_runs(&self, target_id: i64, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Frontier =====

    /// Returns true if the URL is already queued for this target
    fn frontier_contains(&self, target_id: i64, url: &str) -> StorageResult<bool>;

    /// Queues a URL for a target
    ///
    /// Returns `false` without error when the URL is already queued.
    fn enqueue(&mut self, target_id: i64, url: &str, run_id: Option<i64>) -> StorageResult<bool>;

    /// Returns up to `limit` pending entries in discovery order
    fn dequeue_batch(&self, target_id: i64, limit: usize) -> StorageResult<Vec<FrontierEntry>>;

    /// Looks up a pending entry by URL
    fn find_entry(&self, target_id: i64, url: &str) -> StorageResult<Option<FrontierEntry>>;

    /// Removes an entry from the frontier
    ///
    /// Must only be called once the entry's article has been archived, or
    /// when the entry is deliberately skipped.
    fn retire(&mut self, entry_id: i64) -> StorageResult<()>;

    /// Counts pending entries for a target
    fn count_frontier(&self, target_id: i64) -> StorageResult<u64>;

    // ===== Archive =====

    /// Writes an archive record, returning its ID
    fn store_article(&mut self, record: &NewArchiveRecord) -> StorageResult<i64>;

    /// Returns true if the URL has already been archived for this target
    fn is_archived(&self, target_id: i64, url: &str) -> StorageResult<bool>;

    /// Gets the most recent archive record for a URL
    fn get_archived(&self, target_id: i64, url: &str) -> StorageResult<Option<ArchiveRecord>>;

    /// Counts archive records for a target
    fn count_articles(&self, target_id: i64) -> StorageResult<u64>;
}
