//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of one crawl invocation (idle, running, completed, aborted)
//! - `CrawlState`: the mutable state shared by every concurrent work unit pipeline
//!   (seen event links, counters, capacity reservations, stop flag)

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::{Admission, CrawlState};
