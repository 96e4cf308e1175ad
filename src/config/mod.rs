//! Configuration module for the archiver
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file, and reading storage settings from the environment.
//!
//! # Example
//!
//! ```no_run
//! use article_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Batch limit: {}", config.crawler.batch_limit);
//! ```

mod env;
mod parser;
mod types;
mod validation;

// Re-export types
pub use env::{StorageSettings, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_PATH};
pub use types::{Config, CrawlTarget, CrawlerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate_crawler_config, validate_target};
