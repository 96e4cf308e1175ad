//! Crawler coordinator - main crawl orchestration logic
//!
//! One run for one target goes through these phases:
//! - Discover: fetch the listing page (all-or-nothing)
//! - Harvest: extract article links and queue the new ones (per-link errors
//!   are logged and skipped)
//! - Extract: take a bounded batch from the frontier, fetch each article,
//!   archive it and retire its entry (per-item errors are logged and skipped)
//!
//! A fixed delay follows every article fetch, whatever its outcome. Fetches
//! are strictly sequential.

use crate::config::CrawlerConfig;
use crate::crawler::archive::archive_and_retire;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::selectors::{
    extract_article, extract_links, harvestable_links, resolve_href, SelectorSet,
};
use crate::storage::{FrontierEntry, RunCounters, RunStatus, Storage, TargetRecord};
use crate::{ArchiverError, ConfigError};
use std::time::{Duration, Instant};
use url::Url;

/// Per-run crawl settings
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Maximum number of frontier entries processed per run
    pub batch_limit: usize,

    /// Delay after each article fetch
    pub request_delay: Duration,

    /// Hash of the configuration the run was started with
    pub config_hash: String,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig, config_hash: impl Into<String>) -> Self {
        Self {
            batch_limit: config.batch_limit as usize,
            request_delay: Duration::from_millis(config.request_delay_ms),
            config_hash: config_hash.into(),
        }
    }
}

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrawlMode {
    /// Discover, harvest, then extract
    #[default]
    Full,
    /// Only populate the frontier from the listing page
    DiscoverOnly,
    /// Only work through the existing frontier
    ExtractOnly,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Hrefs found on the listing page, fragments included
    pub links_found: u64,
    pub fragments_skipped: u64,
    pub links_enqueued: u64,
    /// Links already queued or already archived
    pub links_known: u64,
    /// Links that could not be resolved or stored
    pub link_errors: u64,
    pub articles_archived: u64,
    pub items_failed: u64,
}

impl CrawlReport {
    pub fn counters(&self) -> RunCounters {
        RunCounters {
            links_enqueued: self.links_enqueued,
            articles_archived: self.articles_archived,
            items_failed: self.items_failed,
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns its fetcher and storage for the duration of the run.
pub struct Coordinator<F, S> {
    target: TargetRecord,
    selectors: SelectorSet,
    settings: CrawlSettings,
    fetcher: F,
    storage: S,
}

impl<F: Fetcher, S: Storage> Coordinator<F, S> {
    /// Creates a coordinator for one target
    ///
    /// Selectors are compiled here, so an invalid target fails before any
    /// network or storage activity.
    pub fn new(
        target: TargetRecord,
        settings: CrawlSettings,
        fetcher: F,
        storage: S,
    ) -> Result<Self, ConfigError> {
        let selectors = SelectorSet::compile(&target.target)?;

        Ok(Self {
            target,
            selectors,
            settings,
            fetcher,
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs one crawl cycle and records it as a run
    ///
    /// Only a listing page failure (or the storage failing outside the
    /// per-item loops) fails the run. Per-item failures are counted in the
    /// report and the items stay queued for the next run.
    pub async fn run(&mut self, mode: CrawlMode) -> Result<CrawlReport, ArchiverError> {
        let run_id = self
            .storage
            .create_run(self.target.id, &self.settings.config_hash)?;
        tracing::info!(
            "Starting run {} for {} ({:?})",
            run_id,
            self.target.target.domain,
            mode
        );

        let start_time = Instant::now();
        let mut report = CrawlReport::default();
        let outcome = self.run_phases(mode, run_id, &mut report).await;

        let status = if outcome.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        if let Err(e) = self
            .storage
            .finish_run(run_id, status, report.counters())
        {
            tracing::warn!("Failed to record end of run {}: {}", run_id, e);
        }

        outcome?;

        tracing::info!(
            "Run {} completed in {:?}: {} links enqueued, {} articles archived, {} failed",
            run_id,
            start_time.elapsed(),
            report.links_enqueued,
            report.articles_archived,
            report.items_failed
        );
        Ok(report)
    }

    async fn run_phases(
        &mut self,
        mode: CrawlMode,
        run_id: i64,
        report: &mut CrawlReport,
    ) -> Result<(), ArchiverError> {
        if mode != CrawlMode::ExtractOnly {
            self.discover(Some(run_id), report).await?;
        }
        if mode != CrawlMode::DiscoverOnly {
            self.extract_batch(report).await?;
        }
        Ok(())
    }

    /// Fetches the listing page and queues every new article link
    pub async fn discover(
        &mut self,
        run_id: Option<i64>,
        report: &mut CrawlReport,
    ) -> Result<(), ArchiverError> {
        let listing_url = self.target.target.url.clone();
        let base_url = Url::parse(&listing_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid listing URL '{}': {}", listing_url, e))
        })?;

        tracing::info!("Fetching listing page {}", listing_url);
        let hrefs = {
            let document = self.fetcher.fetch(&listing_url).await?;
            extract_links(&document, &self.selectors.block, &self.selectors.link)
        };
        let harvestable = harvestable_links(&hrefs);
        report.links_found += hrefs.len() as u64;
        report.fragments_skipped += (hrefs.len() - harvestable.len()) as u64;

        for href in harvestable {
            self.harvest_link(&base_url, href, run_id, report);
        }

        tracing::info!(
            "Harvested {} links from {}: {} new, {} known, {} errors",
            hrefs.len(),
            listing_url,
            report.links_enqueued,
            report.links_known,
            report.link_errors
        );
        Ok(())
    }

    /// Queues one harvested link; failures are logged and counted
    fn harvest_link(
        &mut self,
        base_url: &Url,
        href: &str,
        run_id: Option<i64>,
        report: &mut CrawlReport,
    ) {
        let Some(url) = resolve_href(base_url, href) else {
            tracing::warn!("Skipping unresolvable link '{}' on {}", href, base_url);
            report.link_errors += 1;
            return;
        };

        match self.enqueue_if_new(url.as_str(), run_id) {
            Ok(true) => {
                tracing::debug!("Queued {}", url);
                report.links_enqueued += 1;
            }
            Ok(false) => report.links_known += 1,
            Err(e) => {
                tracing::warn!("Failed to queue {}: {}", url, e);
                report.link_errors += 1;
            }
        }
    }

    fn enqueue_if_new(&mut self, url: &str, run_id: Option<i64>) -> Result<bool, ArchiverError> {
        if self.storage.is_archived(self.target.id, url)? {
            return Ok(false);
        }
        Ok(self.storage.enqueue(self.target.id, url, run_id)?)
    }

    /// Archives up to `batch_limit` queued articles
    pub async fn extract_batch(&mut self, report: &mut CrawlReport) -> Result<(), ArchiverError> {
        let entries = self
            .storage
            .dequeue_batch(self.target.id, self.settings.batch_limit)?;
        tracing::info!("Processing {} queued articles", entries.len());

        let total = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            match self.process_entry(entry).await {
                Ok(archive_id) => {
                    report.articles_archived += 1;
                    tracing::info!(
                        "[{}/{}] Archived {} (id {})",
                        index + 1,
                        total,
                        entry.url,
                        archive_id
                    );
                }
                Err(e) => {
                    report.items_failed += 1;
                    tracing::warn!(
                        "[{}/{}] Failed to archive {}, left queued: {}",
                        index + 1,
                        total,
                        entry.url,
                        e
                    );
                }
            }

            self.throttle().await;
        }

        Ok(())
    }

    /// Fetches, extracts and archives one frontier entry
    async fn process_entry(&mut self, entry: &FrontierEntry) -> Result<i64, ArchiverError> {
        let article = {
            let document = self.fetcher.fetch(&entry.url).await?;
            extract_article(&document, &self.selectors)
        };

        if article.title.is_empty() && article.body.trim().is_empty() {
            tracing::warn!("No title or body matched on {}", entry.url);
        }

        Ok(archive_and_retire(&mut self.storage, entry, article)?)
    }

    async fn throttle(&self) {
        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }
    }
}
