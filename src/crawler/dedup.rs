//! Event deduplication by canonical link
//!
//! A [`SeenSet`] lives for one crawl invocation. It is not synchronized on
//! its own; the orchestrator keeps it inside [`crate::state::CrawlState`]
//! and filters each batch while holding that state's lock.

use crate::crawler::record::EventRecord;
use std::collections::HashSet;

/// Result of filtering one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    /// Records admitted, in input order
    pub novel: Vec<EventRecord>,

    /// Records dropped because their link was already seen
    pub duplicates: usize,

    /// Records dropped because the limit was already reached
    pub truncated: usize,
}

/// Identities of every event admitted so far
#[derive(Debug, Default)]
pub struct SeenSet {
    links: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct links admitted
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns true if the record's link was already admitted
    pub fn contains(&self, record: &EventRecord) -> bool {
        record
            .identity()
            .map(|id| self.links.contains(&id))
            .unwrap_or(false)
    }

    /// Keeps the first record for each link, preserving input order
    ///
    /// Records without a link always pass.
    pub fn filter_novel(&mut self, batch: Vec<EventRecord>) -> Vec<EventRecord> {
        self.filter_novel_up_to(batch, None).novel
    }

    /// Like [`filter_novel`](Self::filter_novel), but admits at most `limit` records
    ///
    /// Records beyond the limit are not added to the set, so a later batch
    /// may still deliver them.
    pub fn filter_novel_up_to(
        &mut self,
        batch: Vec<EventRecord>,
        limit: Option<usize>,
    ) -> Filtered {
        let mut filtered = Filtered {
            novel: Vec::with_capacity(batch.len()),
            ..Filtered::default()
        };

        for record in batch {
            let identity = record.identity();

            if let Some(id) = &identity {
                if self.links.contains(id) {
                    filtered.duplicates += 1;
                    continue;
                }
            }

            if limit.is_some_and(|max| filtered.novel.len() >= max) {
                filtered.truncated += 1;
                continue;
            }

            if let Some(id) = identity {
                self.links.insert(id);
            }
            filtered.novel.push(record);
        }

        filtered
    }
}
