//! Crawl counters and the report returned to callers
//!
//! This module provides the counters a crawl accumulates and the report
//! built from them once the crawl finishes.

use serde::{Deserialize, Serialize};

/// Counters accumulated over one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Events accepted by the callback
    pub total_events: usize,

    /// Work units whose scrape completed
    pub total_categories: usize,

    /// Batches that exhausted their delivery attempts
    pub total_failed_batches: usize,
}

/// Final status of a crawl that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Completed,
}

/// Result of a finished crawl, as returned by the trigger endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub status: CrawlStatus,
    pub total_events: usize,
    pub total_categories: usize,
    pub total_failed_batches: usize,
}

impl CrawlReport {
    /// Builds the report of a completed crawl
    pub fn completed(stats: CrawlStats) -> Self {
        Self {
            status: CrawlStatus::Completed,
            total_events: stats.total_events,
            total_categories: stats.total_categories,
            total_failed_batches: stats.total_failed_batches,
        }
    }
}

/// Prints a crawl report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("  Status: {:?}", report.status);
    println!("  Events delivered: {}", report.total_events);
    println!("  Categories scraped: {}", report.total_categories);
    println!("  Failed batches: {}", report.total_failed_batches);
}
