//! Statistics generation from the archive database
//!
//! This module provides functionality for extracting and displaying
//! per-target crawl statistics from the storage layer.

use crate::storage::{RunRecord, Storage, TargetRecord};
use crate::ArchiverError;

/// Number of runs shown in the statistics
pub const RECENT_RUN_LIMIT: usize = 5;

/// Archive statistics for one target
#[derive(Debug, Clone)]
pub struct ArchiveStatistics {
    /// Target domain
    pub domain: String,

    /// Frontier entries waiting to be archived
    pub pending: u64,

    /// Articles in the archive
    pub archived: u64,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics for a target from storage
pub fn load_statistics(
    storage: &dyn Storage,
    target: &TargetRecord,
) -> Result<ArchiveStatistics, ArchiverError> {
    Ok(ArchiveStatistics {
        domain: target.target.domain.clone(),
        pending: storage.count_frontier(target.id)?,
        archived: storage.count_articles(target.id)?,
        recent_runs: storage.recent_runs(target.id, RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics: {} ===\n", stats.domain);

    println!("Overview:");
    println!("  Pending in frontier: {}", stats.pending);
    println!("  Archived articles: {}", stats.archived);
    println!();

    if stats.recent_runs.is_empty() {
        println!("No runs recorded yet.");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} {} [{}] enqueued {}, archived {}, failed {}",
            run.id,
            run.started_at,
            run.status.to_db_string(),
            run.counters.links_enqueued,
            run.counters.articles_archived,
            run.counters.items_failed
        );
    }
}
