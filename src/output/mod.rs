//! Output module for reporting on the archive
//!
//! This module handles:
//! - Per-target statistics (frontier size, archive size, recent runs)
//! - Printing crawl reports after a run

pub mod stats;

pub use stats::{load_statistics, print_statistics, ArchiveStatistics};

use crate::crawler::CrawlReport;

/// Prints the outcome of a run to stdout
pub fn print_report(domain: &str, report: &CrawlReport) {
    println!("=== Crawl Report: {} ===\n", domain);
    println!("Discovery:");
    println!("  Links found: {}", report.links_found);
    println!("  Fragment links skipped: {}", report.fragments_skipped);
    println!("  Newly queued: {}", report.links_enqueued);
    println!("  Already known: {}", report.links_known);
    println!("  Link errors: {}", report.link_errors);
    println!();
    println!("Extraction:");
    println!("  Archived: {}", report.articles_archived);
    println!("  Failed (left queued): {}", report.items_failed);
}
