//! Output module for crawl statistics and reports

pub mod stats;

pub use stats::{print_report, CrawlReport, CrawlStats, CrawlStatus};
