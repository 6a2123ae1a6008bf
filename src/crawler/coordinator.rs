//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of one
//! crawl invocation, including:
//! - Validating the caller's endpoints before any work starts
//! - Opening and closing one scraper session per location
//! - Running the work units of each category tab through the admission gate
//! - Deduplicating, capping and delivering each unit's batch
//! - Persisting batches the callback never accepted

use crate::config::{validate, Config};
use crate::crawler::scheduler::{generate_work_units, plan_by_location, AdmissionGate, WorkUnit};
use crate::crawler::scraper::CategoryScraper;
use crate::delivery::{deliver, BatchSink, DeliveryOutcome, DeliveryPolicy, HttpSink};
use crate::output::CrawlReport;
use crate::state::{CrawlPhase, CrawlState};
use crate::storage::persist_failed_batch;
use crate::url::{build_category_url, parse_endpoint};
use crate::{Result, SweepError};
use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;

/// Starts crawls on behalf of a trigger
///
/// The HTTP server only depends on this trait, so it can be exercised
/// without a real scraper.
#[async_trait]
pub trait CrawlRunner: Send + Sync {
    async fn run_crawl(&self, base_url: &str, callback_url: &str) -> Result<CrawlReport>;
}

/// Everything a unit pipeline shares with its siblings
struct RunContext<'a> {
    base_url: &'a str,
    sink: &'a dyn BatchSink,
    policy: DeliveryPolicy,
    state: &'a CrawlState,
    gate: &'a AdmissionGate,
    cooldown: Duration,
    persist_dir: Option<PathBuf>,
}

/// Main crawl orchestrator
pub struct Orchestrator<S: CategoryScraper> {
    config: Config,
    scraper: S,
}

impl<S: CategoryScraper> Orchestrator<S> {
    /// Creates an orchestrator, validating the configuration once up front
    pub fn new(config: Config, scraper: S) -> Result<Self> {
        validate(&config)?;
        Ok(Self { config, scraper })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a complete crawl, delivering batches to `callback_url`
    ///
    /// Both endpoints are checked before any session is opened. Returns the
    /// final counters once every work unit ran or the event cap was reached.
    pub async fn run(&self, base_url: &str, callback_url: &str) -> Result<CrawlReport> {
        let base_url = require_endpoint("baseUrl", base_url)?;
        let callback_url = require_endpoint("callbackUrl", callback_url)?;

        let policy = DeliveryPolicy::from(&self.config.delivery);
        let sink = HttpSink::new(callback_url, policy.timeout_per_attempt)?;

        self.run_with_sink(&base_url, &sink).await
    }

    /// Runs a complete crawl, delivering batches to an arbitrary sink
    pub async fn run_with_sink(&self, base_url: &str, sink: &dyn BatchSink) -> Result<CrawlReport> {
        let base_url = require_endpoint("baseUrl", base_url)?;

        let mut phase = CrawlPhase::Idle;
        phase.advance(CrawlPhase::Running)?;

        let units = generate_work_units(&self.config.locations, &self.config.categories);
        let plans = plan_by_location(&units);
        let state = CrawlState::new(self.config.crawler.max_events);
        let gate = AdmissionGate::new(self.config.crawler.concurrency);

        let ctx = RunContext {
            base_url: &base_url,
            sink,
            policy: DeliveryPolicy::from(&self.config.delivery),
            state: &state,
            gate: &gate,
            cooldown: Duration::from_millis(self.config.crawler.cooldown_ms),
            persist_dir: self
                .config
                .persistence
                .enabled
                .then(|| PathBuf::from(&self.config.persistence.directory)),
        };

        tracing::info!(
            "Starting crawl: {} work units across {} locations (concurrency {}, max events {})",
            units.len(),
            self.config.locations.len(),
            gate.limit(),
            self.config
                .crawler
                .max_events
                .map_or_else(|| "unlimited".to_string(), |cap| cap.to_string())
        );

        let mut sessions_opened = 0usize;
        let mut last_setup_error = None;

        for location in &self.config.locations {
            if state.is_stopped() {
                break;
            }

            let session = match self.scraper.open_session(location).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("Skipping location {}: {}", location, e);
                    last_setup_error = Some(e.to_string());
                    continue;
                }
            };
            sessions_opened += 1;
            tracing::info!("Crawling location {}", location);

            let tabs = plans
                .iter()
                .find(|plan| plan.location == location.as_str())
                .map(|plan| plan.tabs.as_slice())
                .unwrap_or_default();

            for tab_units in tabs {
                if state.is_stopped() {
                    break;
                }

                let pipelines = tab_units
                    .iter()
                    .map(|unit| self.run_unit(&ctx, &session, unit));
                join_all(pipelines).await;
            }

            self.scraper.close_session(session).await;
        }

        if sessions_opened == 0 && !self.config.locations.is_empty() {
            phase.advance(CrawlPhase::Aborted)?;
            return Err(SweepError::SetupFailed {
                locations: self.config.locations.len(),
                last_error: last_setup_error.unwrap_or_default(),
            });
        }

        phase.advance(CrawlPhase::Completed)?;
        let stats = state.stats();

        tracing::info!(
            "Crawl completed: {} events delivered from {} categories, {} failed batches",
            stats.total_events,
            stats.total_categories,
            stats.total_failed_batches
        );

        Ok(CrawlReport::completed(stats))
    }

    /// Processes one work unit from admission to cooldown
    ///
    /// Never fails: scrape errors skip the unit and delivery failures are
    /// counted (and persisted when enabled).
    async fn run_unit(&self, ctx: &RunContext<'_>, session: &S::Session, unit: &WorkUnit) {
        let Some(_permit) = ctx.gate.enter().await else {
            return;
        };

        if ctx.state.is_stopped() {
            tracing::debug!("Event cap reached, not starting {}", unit);
            return;
        }

        let category_url = build_category_url(ctx.base_url, &unit.location, &unit.sub_category);
        tracing::info!("Scraping {} from {}", unit, category_url);

        let scraped = match self
            .scraper
            .scrape_category(session, &category_url, unit)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", unit, e);
                return;
            }
        };

        let scraped_count = scraped.len();
        let admission = ctx.state.admit(scraped);
        if admission.duplicates > 0 || admission.truncated > 0 {
            tracing::debug!(
                "{}: {} scraped, {} duplicates, {} over the event cap",
                unit,
                scraped_count,
                admission.duplicates,
                admission.truncated
            );
        }

        if admission.batch.is_empty() {
            tracing::info!("No new events for {}", unit);
            return;
        }

        let count = admission.batch.len();
        match deliver(ctx.sink, &admission.batch, &ctx.policy).await {
            DeliveryOutcome::Delivered { count } => {
                tracing::info!("Delivered {} events for {}", count, unit);
                if ctx.state.record_delivered(count) {
                    tracing::info!(
                        "Reached max events ({} delivered), no further categories will start",
                        ctx.state.stats().total_events
                    );
                }
            }
            DeliveryOutcome::Failed {
                attempts,
                last_error,
            } => {
                ctx.state.record_failed(count);
                tracing::error!(
                    "Dropping batch of {} events for {} after {} attempts: {}",
                    count,
                    unit,
                    attempts,
                    last_error
                );

                if let Some(dir) = &ctx.persist_dir {
                    persist_failed_batch(dir, &unit.location, &unit.sub_category, &admission.batch)
                        .await;
                }
            }
        }

        tokio::time::sleep(ctx.cooldown).await;
    }
}

#[async_trait]
impl<S> CrawlRunner for Orchestrator<S>
where
    S: CategoryScraper + 'static,
{
    async fn run_crawl(&self, base_url: &str, callback_url: &str) -> Result<CrawlReport> {
        self.run(base_url, callback_url).await
    }
}

/// Checks a caller-supplied endpoint, returning it trimmed
fn require_endpoint(name: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SweepError::MissingParameter(name));
    }

    parse_endpoint(trimmed).map_err(|e| SweepError::InvalidParameter {
        name,
        reason: e.to_string(),
    })?;

    Ok(trimmed.to_string())
}
