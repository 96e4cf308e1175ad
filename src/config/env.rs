//! Storage settings sourced from the environment
//!
//! The archive lives in an embedded SQLite file. Its location and lock
//! timeout come from environment variables with local-development defaults.

use crate::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the database file
pub const DATABASE_PATH_VAR: &str = "ARCHIVER_DATABASE_PATH";

/// Environment variable for the SQLite busy timeout (milliseconds)
pub const BUSY_TIMEOUT_VAR: &str = "ARCHIVER_BUSY_TIMEOUT_MS";

pub const DEFAULT_DATABASE_PATH: &str = "article-archiver.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Connection parameters for the archive store
///
/// The store is an embedded SQLite file opened in-process, so there is no
/// server to reach: host, port, user, password and database name have no
/// meaning here. The file path plays the role of the database name and the
/// busy timeout bounds how long a run waits on a lock held by another
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub database_path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl StorageSettings {
    /// Reads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary lookup function
    ///
    /// Unset or blank variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path = value(DATABASE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let busy_timeout_ms = match value(BUSY_TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Validation(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    BUSY_TIMEOUT_VAR, raw
                ))
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            database_path,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }
}
