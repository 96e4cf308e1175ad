//! Crawler module for article discovery and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed timeout
//! - Selector-driven link and text extraction
//! - Archiving extracted articles and retiring frontier entries
//! - Overall crawl coordination and rate limiting

mod archive;
mod coordinator;
mod fetcher;
mod selectors;

pub use archive::{archive_and_retire, build_record, skip_url};
pub use coordinator::{Coordinator, CrawlMode, CrawlReport, CrawlSettings};
pub use fetcher::{
    build_http_client, FetchError, FetchErrorKind, Fetcher, HttpFetcher, REQUEST_TIMEOUT,
};
pub use selectors::{
    extract_article, extract_links, extract_text, harvestable_links, is_fragment_link,
    parse_selector, remove_classes, resolve_href, ExtractedArticle, SelectorSet, TextShape,
};

use crate::config::{validate_target, Config, CrawlerConfig};
use crate::storage::{Storage, StorageError, TargetRecord};
use crate::{ArchiverError, ConfigError};

/// Registers (or updates) the configuration file's target in storage
pub fn register_target<S: Storage>(
    storage: &mut S,
    config: &Config,
) -> Result<TargetRecord, ArchiverError> {
    let target = config.target.clone().ok_or_else(|| {
        ConfigError::MissingTarget("configuration has no [target] section".to_string())
    })?;

    let id = storage.upsert_target(&target)?;
    tracing::debug!("Registered target {} (id {})", target.domain, id);
    Ok(TargetRecord { id, target })
}

/// Loads a previously stored target by domain
///
/// The stored selectors are validated again before they are used.
pub fn load_target<S: Storage>(
    storage: &S,
    domain: &str,
) -> Result<TargetRecord, ArchiverError> {
    let Some(record) = storage.get_target_by_domain(domain)? else {
        let known: Vec<String> = storage
            .list_targets()?
            .into_iter()
            .map(|record| record.target.domain)
            .collect();
        tracing::warn!("Known targets: {}", known.join(", "));
        return Err(StorageError::TargetNotFound(domain.to_string()).into());
    };

    validate_target(&record.target)?;
    Ok(record)
}

/// Runs one crawl cycle for a resolved target
///
/// This is the library entry point behind the binary. It builds the HTTP
/// fetcher from the crawler settings and hands it, together with the
/// storage, to a [`Coordinator`] running the requested phases.
///
/// # Example
///
/// ```no_run
/// use article_archiver::config::{load_config_with_hash, StorageSettings};
/// use article_archiver::crawler::{crawl, register_target, CrawlMode};
/// use article_archiver::storage::open_storage;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("archiver.toml"))?;
/// let mut storage = open_storage(&StorageSettings::from_env()?)?;
/// let target = register_target(&mut storage, &config)?;
/// let report = crawl(&config.crawler, &hash, target, storage, CrawlMode::Full).await?;
/// println!("Archived {} articles", report.articles_archived);
/// # Ok(())
/// # }
/// ```
pub async fn crawl<S: Storage>(
    crawler: &CrawlerConfig,
    config_hash: &str,
    target: TargetRecord,
    storage: S,
    mode: CrawlMode,
) -> Result<CrawlReport, ArchiverError> {
    let fetcher = HttpFetcher::new(&crawler.user_agent)?;
    let settings = CrawlSettings::from_config(crawler, config_hash);

    let mut coordinator = Coordinator::new(target, settings, fetcher, storage)?;
    coordinator.run(mode).await
}
