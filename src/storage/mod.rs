//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the archiver, including:
//! - SQLite database initialization and schema management
//! - Crawl target persistence
//! - The URL frontier (deduplicated queue of pending article URLs)
//! - The article archive
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::{CrawlTarget, StorageSettings};
use crate::ArchiverError;

/// Opens the storage database described by the settings
///
/// Failure to open is reported as a connectivity error, which is fatal for
/// the run.
pub fn open_storage(settings: &StorageSettings) -> Result<SqliteStorage, ArchiverError> {
    SqliteStorage::open(&settings.database_path, settings.busy_timeout).map_err(|source| {
        ArchiverError::Connectivity {
            path: settings.database_path.display().to_string(),
            source,
        }
    })
}

/// A crawl target together with its storage identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: i64,
    pub target: CrawlTarget,
}

/// A discovered article URL waiting to be archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub id: i64,
    pub target_id: i64,
    pub url: String,
    pub discovered_at: String,
    pub discovered_run: Option<i64>,
}

/// An archived article as stored
#[derive(Debug, Clone)]
pub struct ArchiveRecord {
    pub id: i64,
    pub target_id: i64,
    pub url: String,
    pub title: String,
    pub body: String,
    pub article_updated_at: String,
    pub created_at: String,
}

/// An article ready to be written to the archive
#[derive(Debug, Clone)]
pub struct NewArchiveRecord {
    pub target_id: i64,
    pub url: String,
    pub title: String,
    pub body: String,
    pub article_updated_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub target_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counters: RunCounters,
}

/// Outcome counters persisted with a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub links_enqueued: u64,
    pub articles_archived: u64,
    pub items_failed: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
