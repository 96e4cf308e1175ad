//! Article Archiver: a selector-driven article crawler
//!
//! This crate fetches a site's listing page, harvests article links with
//! configured CSS selectors, queues them in a persistent frontier, and then
//! archives the title, body and update timestamp of each article at a polite,
//! fixed request rate.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for archiver operations
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage unreachable at {path}: {source}")]
    Connectivity {
        path: String,
        source: storage::StorageError,
    },

    #[error("{0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for '{field}': {message}")]
    InvalidSelector { field: &'static str, message: String },

    #[error("No crawl target found: {0}")]
    MissingTarget(String),
}

// Re-export commonly used types
pub use config::{Config, CrawlTarget};
pub use crawler::{Coordinator, CrawlMode, CrawlReport, FetchError};
