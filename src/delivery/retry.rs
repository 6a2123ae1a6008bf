//! Retry with linear, capped backoff
//!
//! Shared by batch delivery and by the scraper's page loads so both follow
//! the same attempt numbering, per-attempt timeout and wait schedule.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Linear backoff: attempt `n` waits `min(cap, base * n)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Wait after failed attempt number `attempt` (numbered from 1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt).min(self.cap)
    }

    /// Waits between `max_attempts` attempts: one per attempt except the last
    pub fn schedule(&self, max_attempts: u32) -> Vec<Duration> {
        (1..max_attempts).map(|n| self.delay_for(n)).collect()
    }
}

/// How many times to try an operation and how long each try may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first; values below 1 behave as 1
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Backoff,
}

/// Why a single attempt failed
#[derive(Debug)]
pub enum AttemptError<E> {
    /// The attempt did not finish within the per-attempt timeout
    TimedOut(Duration),
    /// The operation itself returned an error
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(after) => write!(f, "timed out after {:?}", after),
            Self::Failed(e) => e.fmt(f),
        }
    }
}

/// Every attempt failed
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: AttemptError<E>,
}

/// Runs `op` until it succeeds or the policy's attempts are used up
///
/// `op` receives the attempt number, starting at 1. Each attempt runs under
/// its own timeout; a timeout counts as a failed attempt. After failed
/// attempt `n` (except the last) the call sleeps `backoff.delay_for(n)`.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match tokio::time::timeout(policy.attempt_timeout, op(attempt)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => AttemptError::Failed(e),
            Err(_) => AttemptError::TimedOut(policy.attempt_timeout),
        };

        tracing::warn!(
            "{} failed (attempt {}/{}): {}",
            label,
            attempt,
            max_attempts,
            error
        );

        if attempt >= max_attempts {
            return Err(RetryExhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        tokio::time::sleep(policy.backoff.delay_for(attempt)).await;
        attempt += 1;
    }
}
