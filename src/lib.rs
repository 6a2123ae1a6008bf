//! Event-Sweep: an events-listing crawler with reliable batch delivery
//!
//! This crate walks a fixed list of location / category / subcategory
//! combinations, scrapes event records for each one, deduplicates them by
//! canonical link and forwards each batch to a callback URL with bounded
//! retries, a global event cap and optional persistence of failed batches.

pub mod config;
pub mod crawler;
pub mod delivery;
pub mod output;
pub mod server;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Event-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("No browsing session could be opened for any of {locations} locations: {last_error}")]
    SetupFailed { locations: usize, last_error: String },

    #[error("Delivery error: {0}")]
    Delivery(#[from] delivery::DeliveryError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    /// Returns true if this error was raised before any crawl work began
    /// because the caller supplied missing or malformed input
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidParameter { .. }
        )
    }
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
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Event-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    generate_work_units, CategoryTab, CrawlRunner, EventRecord, Orchestrator, WorkUnit,
};
pub use delivery::{deliver, DeliveryOutcome, DeliveryPolicy};
pub use output::{CrawlReport, CrawlStats};
pub use state::CrawlPhase;
