use crate::crawler::dedup::{Filtered, SeenSet};
use crate::crawler::record::EventRecord;
use crate::output::CrawlStats;
use std::sync::{Mutex, MutexGuard};

/// A batch admitted for delivery, with the capacity it reserved
#[derive(Debug)]
pub struct Admission {
    /// Novel records, truncated to the remaining capacity
    pub batch: Vec<EventRecord>,

    /// Records dropped as already seen
    pub duplicates: usize,

    /// Novel records dropped because the cap left no room for them
    pub truncated: usize,
}

#[derive(Debug, Default)]
struct Inner {
    seen: SeenSet,
    stats: CrawlStats,
    /// Events admitted but not yet resolved by a delivery attempt
    reserved: usize,
    cap_reached: bool,
}

/// Mutable state shared by all work unit pipelines of one crawl
///
/// Every read-modify-write goes through a single mutex, so concurrent
/// pipelines see a consistent seen set and consistent counters. The lock
/// is never held across an `.await`.
///
/// Capacity works by reservation: admitting a batch reserves room for it
/// under the cap; delivery commits the reservation and failure releases it.
/// Delivered events therefore never exceed the cap, even with several
/// batches in flight.
#[derive(Debug)]
pub struct CrawlState {
    cap: Option<usize>,
    inner: Mutex<Inner>,
}

impl CrawlState {
    /// Creates the state for a crawl delivering at most `cap` events (`None` = unlimited)
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // no method can panic halfway through a mutation, so a poisoned Inner is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns true once delivered events reached the cap
    pub fn is_stopped(&self) -> bool {
        self.lock().cap_reached
    }

    /// Counts a scraped unit, deduplicates its batch and reserves capacity for it
    ///
    /// Dedup runs first, then the novel records are truncated to the
    /// remaining capacity. Records cut by the cap are not marked as seen.
    pub fn admit(&self, batch: Vec<EventRecord>) -> Admission {
        let mut inner = self.lock();
        inner.stats.total_categories += 1;

        let remaining = self
            .cap
            .map(|cap| cap.saturating_sub(inner.stats.total_events + inner.reserved));

        let Filtered {
            novel,
            duplicates,
            truncated,
        } = inner.seen.filter_novel_up_to(batch, remaining);

        inner.reserved += novel.len();

        Admission {
            batch: novel,
            duplicates,
            truncated,
        }
    }

    /// Commits a delivered batch
    ///
    /// Returns true for exactly one caller: the one whose delivery reached
    /// the cap. That caller owns the stop announcement.
    pub fn record_delivered(&self, count: usize) -> bool {
        let mut inner = self.lock();
        inner.reserved = inner.reserved.saturating_sub(count);
        inner.stats.total_events += count;

        let reached = self.cap.is_some_and(|cap| inner.stats.total_events >= cap);
        if reached && !inner.cap_reached {
            inner.cap_reached = true;
            return true;
        }
        false
    }

    /// Releases the reservation of a batch that could not be delivered
    pub fn record_failed(&self, count: usize) {
        let mut inner = self.lock();
        inner.reserved = inner.reserved.saturating_sub(count);
        inner.stats.total_failed_batches += 1;
    }

    /// Returns a copy of the counters
    pub fn stats(&self) -> CrawlStats {
        self.lock().stats
    }

    /// Number of distinct event links admitted so far
    pub fn seen_links(&self) -> usize {
        self.lock().seen.len()
    }
}
