//! Batch delivery to the callback sink
//!
//! This module handles:
//! - The [`BatchSink`] seam and its HTTP implementation
//! - All-or-nothing delivery of a batch with per-attempt timeouts
//! - Linear, capped backoff between attempts (shared with the scraper)

mod http;
pub mod retry;
mod traits;

pub use http::{build_callback_client, HttpSink};
pub use retry::{retry_with_backoff, AttemptError, Backoff, RetryExhausted, RetryPolicy};
pub use traits::{BatchSink, DeliveryError, DeliveryResult};

use crate::config::DeliveryConfig;
use crate::crawler::EventRecord;
use std::time::Duration;

/// Retry budget and timing for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Attempts per batch, including the first
    pub max_retries: u32,
    pub timeout_per_attempt: Duration,
    pub backoff: Backoff,
}

impl DeliveryPolicy {
    fn as_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            attempt_timeout: self.timeout_per_attempt,
            backoff: self.backoff,
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

impl From<&DeliveryConfig> for DeliveryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout_per_attempt: Duration::from_millis(config.timeout_ms),
            backoff: Backoff::new(
                Duration::from_millis(config.backoff_base_ms),
                Duration::from_millis(config.backoff_cap_ms),
            ),
        }
    }
}

/// Outcome of delivering one batch
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The sink accepted the whole batch
    Delivered { count: usize },

    /// Every attempt failed; nothing was delivered
    Failed {
        attempts: u32,
        last_error: DeliveryError,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Delivers a batch to the sink, all or nothing
///
/// An empty batch is reported as delivered without contacting the sink.
/// Otherwise the batch is posted whole up to `policy.max_retries` times,
/// waiting `min(cap, base * attempt)` after each failed attempt but the last.
pub async fn deliver(
    sink: &dyn BatchSink,
    batch: &[EventRecord],
    policy: &DeliveryPolicy,
) -> DeliveryOutcome {
    if batch.is_empty() {
        return DeliveryOutcome::Delivered { count: 0 };
    }

    let label = format!("Callback post of {} events to {}", batch.len(), sink.target());
    let result = retry_with_backoff(&policy.as_retry_policy(), &label, |_| sink.post(batch)).await;

    match result {
        Ok(()) => DeliveryOutcome::Delivered { count: batch.len() },
        Err(RetryExhausted {
            attempts,
            last_error,
        }) => {
            let last_error = match last_error {
                AttemptError::Failed(e) => e,
                AttemptError::TimedOut(after) => DeliveryError::Timeout(after),
            };
            tracing::error!(
                "Callback failed after {} attempts: {}",
                attempts,
                last_error
            );
            DeliveryOutcome::Failed {
                attempts,
                last_error,
            }
        }
    }
}
