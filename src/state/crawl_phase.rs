//! Lifecycle phases of a crawl invocation

use crate::SweepError;
use std::fmt;

/// Represents the phase a crawl is in
///
/// ```text
/// Idle -> Running -> Completed
///                 -> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Created, preconditions not yet checked
    Idle,

    /// Walking the work units
    Running,

    /// Work units exhausted or the event cap was reached
    Completed,

    /// No browsing session could be opened for any location
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), SweepError> {
        if !self.can_transition_to(next) {
            return Err(SweepError::InvalidTransition { from: *self, to: next });
        }
        tracing::debug!("Crawl phase {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    /// Returns the lowercase name used in reports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
