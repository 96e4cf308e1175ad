//! Article Archiver main entry point
//!
//! This is the command-line interface for the selector-driven article
//! archiver.

use anyhow::Context;
use article_archiver::config::{
    load_config_with_hash, validate_crawler_config, Config, StorageSettings,
};
use article_archiver::crawler::{crawl, load_target, register_target, skip_url, CrawlMode};
use article_archiver::output::{load_statistics, print_report, print_statistics};
use article_archiver::storage::{open_storage, SqliteStorage, TargetRecord};
use article_archiver::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Article Archiver: a selector-driven article crawler
///
/// Fetches a site's listing page, queues newly discovered article links and
/// archives a bounded batch of queued articles per run, pausing between
/// requests. The database location is read from ARCHIVER_DATABASE_PATH.
#[derive(Parser, Debug)]
#[command(name = "article-archiver")]
#[command(version)]
#[command(about = "A selector-driven article crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Crawl a target stored in the database instead of the file's [target]
    #[arg(long, value_name = "DOMAIN")]
    target: Option<String>,

    /// Override the number of articles archived in this run
    #[arg(long, value_name = "N")]
    batch_limit: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only fetch the listing page and queue new article links
    #[arg(long, conflicts_with_all = ["extract_only", "dry_run", "stats", "drop"])]
    discover_only: bool,

    /// Only archive already queued articles
    #[arg(long, conflicts_with_all = ["discover_only", "dry_run", "stats", "drop"])]
    extract_only: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "drop"])]
    dry_run: bool,

    /// Show frontier and archive statistics for the target and exit
    #[arg(long, conflicts_with_all = ["dry_run", "drop"])]
    stats: bool,

    /// Remove a queued URL from the frontier without archiving it
    #[arg(long, value_name = "URL")]
    drop: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(limit) = cli.batch_limit {
        config.crawler.batch_limit = limit;
        validate_crawler_config(&config.crawler)?;
    }

    let storage_settings = StorageSettings::from_env()?;

    if cli.dry_run && cli.target.is_none() {
        let target = config
            .target
            .clone()
            .ok_or_else(|| ConfigError::MissingTarget("no [target] section".to_string()))?;
        // Not registered yet, so there is no stored ID
        let preview = TargetRecord { id: 0, target };
        handle_dry_run(&config, &preview, &storage_settings);
        return Ok(());
    }

    let mut storage = match open_storage(&storage_settings) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    let target = resolve_target(&cli, &config, &mut storage)?;

    if cli.dry_run {
        handle_dry_run(&config, &target, &storage_settings);
    } else if cli.stats {
        let stats = load_statistics(&storage, &target)?;
        print_statistics(&stats);
    } else if let Some(url) = &cli.drop {
        handle_drop(&mut storage, &target, url)?;
    } else {
        let mode = if cli.discover_only {
            CrawlMode::DiscoverOnly
        } else if cli.extract_only {
            CrawlMode::ExtractOnly
        } else {
            CrawlMode::Full
        };
        handle_crawl(config, &config_hash, target, storage, mode, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that reports on stdout stay clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("article_archiver=info,warn"),
            1 => EnvFilter::new("article_archiver=debug,info"),
            2 => EnvFilter::new("article_archiver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the target for this run
///
/// `--target` looks a stored target up by domain. Otherwise the file's
/// `[target]` is registered (or updated) in the store.
fn resolve_target(
    cli: &Cli,
    config: &Config,
    storage: &mut SqliteStorage,
) -> anyhow::Result<TargetRecord> {
    match &cli.target {
        Some(domain) => load_target(&*storage, domain).context("Failed to load crawl target"),
        None => register_target(storage, config).context("Failed to register crawl target"),
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, target: &TargetRecord, storage: &StorageSettings) {
    println!("=== Article Archiver Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch limit: {}", config.crawler.batch_limit);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nStorage:");
    println!("  Database: {}", storage.database_path.display());

    let t = &target.target;
    println!("\nTarget: {}", t.domain);
    println!("  Listing page: {}", t.url);
    println!("  Block: {}", t.block);
    println!("  Article link: {}", t.article_link);
    println!("  Title: {}", t.title);
    println!("  Body: {}", t.body);
    println!("  Updated at: {}", t.article_updated_at);
    println!("  Remove: {}", t.remove_class);

    println!("\n✓ Configuration is valid");
}

/// Handles the --drop mode: explicit skip of a queued URL
fn handle_drop(storage: &mut SqliteStorage, target: &TargetRecord, url: &str) -> anyhow::Result<()> {
    if skip_url(storage, target.id, url)? {
        println!("Dropped {} from the {} frontier", url, target.target.domain);
    } else {
        println!("{} is not queued for {}", url, target.target.domain);
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    target: TargetRecord,
    storage: SqliteStorage,
    mode: CrawlMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let domain = target.target.domain.clone();

    match crawl(&config.crawler, config_hash, target, storage, mode).await {
        Ok(report) => {
            if !quiet {
                print_report(&domain, &report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl of {} failed: {}", domain, e);
            Err(e.into())
        }
    }
}
