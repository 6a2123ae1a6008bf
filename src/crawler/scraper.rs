//! The category scraper seam
//!
//! The orchestrator only knows this trait. The built-in implementation
//! fetches listing and detail pages over HTTP ([`super::HtmlCategoryScraper`]);
//! tests plug in scripted scrapers.

use crate::crawler::record::EventRecord;
use crate::crawler::scheduler::WorkUnit;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while opening a session or scraping one category
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to open session for {location}: {reason}")]
    Session { location: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Gave up on {url} after {attempts} attempts: {reason}")]
    PageLoad {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Produces event records for work units
///
/// A session is opened once per location and shared by every unit of that
/// location, possibly by several units at once. The orchestrator closes it
/// exactly once, after all of them finished.
#[async_trait]
pub trait CategoryScraper: Send + Sync {
    /// Per-location browsing context
    type Session: Send + Sync;

    async fn open_session(&self, location: &str) -> Result<Self::Session, ScrapeError>;

    /// Scrapes every event listed at `category_url`
    ///
    /// Individual detail pages that fail are skipped; an error means the
    /// listing itself could not be processed.
    async fn scrape_category(
        &self,
        session: &Self::Session,
        category_url: &str,
        unit: &WorkUnit,
    ) -> Result<Vec<EventRecord>, ScrapeError>;

    async fn close_session(&self, _session: Self::Session) {}
}
