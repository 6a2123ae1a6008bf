//! Storage module for batches the callback never accepted
//!
//! This module handles the on-disk side of delivery failures, including:
//! - Writing one JSON file per permanently failed batch
//! - Reading those files back in the order they were written
//! - Replaying them against a sink and removing the ones that went through

mod failed_batches;

pub use failed_batches::{
    batch_file_name, load_failed_batches, persist_failed_batch, replay_failed_batches,
    write_failed_batch, FailedBatchFile, FailedBatchRecord, ReplaySummary,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or reading failed batches
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for persistence operations
pub type PersistResult<T> = Result<T, PersistError>;
