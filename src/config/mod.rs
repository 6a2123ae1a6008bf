//! Configuration module for Event-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use event_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawling {} locations", config.locations.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoriesConfig, Config, CrawlerConfig, DeliveryConfig, PersistenceConfig, ScraperConfig,
    ServerConfig, DEFAULT_ACTIVITY_SUBCATEGORIES, DEFAULT_EVENT_SUBCATEGORIES, DEFAULT_LOCATIONS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_CONCURRENCY};
