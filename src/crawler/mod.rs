//! Crawler module for scraping event listings and orchestrating delivery
//!
//! This module contains the core crawling logic, including:
//! - Work unit generation and admission control
//! - The category scraper seam and its HTTP implementation
//! - HTML parsing of listing and detail pages
//! - Event records and link-based deduplication
//! - Overall crawl coordination

mod coordinator;
pub mod dedup;
mod fetcher;
mod parser;
pub mod record;
mod scheduler;
mod scraper;

pub use coordinator::{CrawlRunner, Orchestrator};
pub use dedup::{Filtered, SeenSet};
pub use fetcher::{build_page_client, fetch_page, HtmlCategoryScraper, HttpSession};
pub use parser::{extract_event, extract_event_links};
pub use record::EventRecord;
pub use scheduler::{
    generate_work_units, plan_by_location, AdmissionGate, CategoryTab, LocationPlan, WorkUnit,
};
pub use scraper::{CategoryScraper, ScrapeError};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::Result;

/// Runs a complete crawl with the built-in HTTP scraper
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and both endpoints
/// 2. Open one HTTP session per location
/// 3. Scrape, deduplicate and deliver every work unit
/// 4. Return the final counters
pub async fn crawl(config: Config, base_url: &str, callback_url: &str) -> Result<CrawlReport> {
    let scraper = HtmlCategoryScraper::new(config.scraper.clone());
    Orchestrator::new(config, scraper)?
        .run(base_url, callback_url)
        .await
}
