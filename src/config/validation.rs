use crate::config::types::{
    CategoriesConfig, Config, CrawlerConfig, DeliveryConfig, PersistenceConfig, ScraperConfig,
    ServerConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;

/// Largest accepted number of concurrent work units
pub const MAX_CONCURRENCY: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_locations(&config.locations)?;
    validate_categories(&config.categories)?;
    validate_crawler_config(&config.crawler)?;
    validate_delivery_config(&config.delivery)?;
    validate_persistence_config(&config.persistence)?;
    validate_scraper_config(&config.scraper)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Locations end up in URL paths and file names, so only slug characters are allowed
fn validate_locations(locations: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for location in locations {
        validate_slug("location", location)?;
        if !seen.insert(location.as_str()) {
            return Err(ConfigError::Validation(format!(
                "location '{}' is listed more than once",
                location
            )));
        }
    }
    Ok(())
}

fn validate_categories(categories: &CategoriesConfig) -> Result<(), ConfigError> {
    for (tab, subs) in [
        ("activities", &categories.activities),
        ("events", &categories.events),
    ] {
        let mut seen = HashSet::new();
        for sub in subs {
            validate_slug("subcategory", sub)?;
            if !seen.insert(sub.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "subcategory '{}' is listed more than once under {}",
                    sub, tab
                )));
            }
        }
    }
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_events == Some(0) {
        return Err(ConfigError::Validation(
            "max_events must be >= 1 when set (leave it unset for no limit)".to_string(),
        ));
    }

    Ok(())
}

fn validate_delivery_config(config: &DeliveryConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "delivery timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.backoff_cap_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_cap_ms ({}) must not be smaller than backoff_base_ms ({})",
            config.backoff_cap_ms, config.backoff_base_ms
        )));
    }

    Ok(())
}

fn validate_persistence_config(config: &PersistenceConfig) -> Result<(), ConfigError> {
    if config.enabled && config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "persistence directory cannot be empty when persistence is enabled".to_string(),
        ));
    }
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.page_max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "page_max_attempts must be >= 1, got {}",
            config.page_max_attempts
        )));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if config.listing_timeout_ms < 1 || config.page_attempt_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "scraper timeouts must be >= 1ms".to_string(),
        ));
    }

    if config.link_pattern.is_empty() {
        return Err(ConfigError::Validation(
            "link_pattern cannot be empty".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("invalid server bind address '{}': {}", config.bind, e))
    })?;
    Ok(())
}

/// Checks that a value is a lowercase slug (`a-z`, `0-9`, `-`)
fn validate_slug(kind: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", kind)));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must contain only lowercase letters, digits and hyphens",
            kind, value
        )));
    }

    if value.starts_with('-') || value.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "{} '{}' cannot start or end with '-'",
            kind, value
        )));
    }

    Ok(())
}
