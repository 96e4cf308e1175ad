use crate::config::types::{Config, CrawlTarget, CrawlerConfig};
use crate::crawler::SelectorSet;
use crate::ConfigError;
use url::Url;

/// Politeness floor for the inter-request delay
const MIN_REQUEST_DELAY_MS: u64 = 1000;

/// Upper bound on the per-run batch size
const MAX_BATCH_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    if let Some(target) = &config.target {
        validate_target(target)?;
    }
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_limit < 1 || config.batch_limit > MAX_BATCH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "batch_limit must be between 1 and {}, got {}",
            MAX_BATCH_LIMIT, config.batch_limit
        )));
    }

    if config.request_delay_ms < MIN_REQUEST_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be >= {}ms, got {}ms",
            MIN_REQUEST_DELAY_MS, config.request_delay_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a crawl target
///
/// Every selector must be non-empty and compile; the listing URL must be an
/// absolute HTTP(S) URL.
pub fn validate_target(target: &CrawlTarget) -> Result<(), ConfigError> {
    validate_domain_string(&target.domain)?;

    let url = Url::parse(&target.url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid listing URL '{}': {}", target.url, e))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Listing URL '{}' must use HTTP or HTTPS",
            target.url
        )));
    }

    for (field, value) in [
        ("block", &target.block),
        ("article_link", &target.article_link),
        ("title", &target.title),
        ("body", &target.body),
        ("article_updated_at", &target.article_updated_at),
        ("remove_class", &target.remove_class),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} selector cannot be empty",
                field
            )));
        }
    }

    SelectorSet::compile(target)?;

    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
