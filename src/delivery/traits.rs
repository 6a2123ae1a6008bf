//! Sink trait and delivery error types

use crate::crawler::EventRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a single delivery attempt
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error posting to {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Callback {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Delivery attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Sink rejected batch: {0}")]
    Rejected(String),
}

/// Result type for delivery operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Destination for event batches
///
/// One call to [`post`](BatchSink::post) is one delivery attempt carrying the
/// whole batch. Retrying is the caller's business (see [`crate::delivery::deliver`]).
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Sends the whole batch once
    async fn post(&self, batch: &[EventRecord]) -> DeliveryResult<()>;

    /// Human-readable destination, used in logs
    fn target(&self) -> &str;
}
