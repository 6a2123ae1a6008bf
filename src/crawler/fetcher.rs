//! HTTP category scraper
//!
//! This module handles all page requests of the built-in scraper, including:
//! - Building the per-location HTTP client
//! - Loading a listing page under a single timeout
//! - Loading detail pages with retry logic
//! - Abandoning a listing after repeated detail page failures

use crate::config::ScraperConfig;
use crate::crawler::parser::{extract_event, extract_event_links};
use crate::crawler::record::EventRecord;
use crate::crawler::scheduler::WorkUnit;
use crate::crawler::scraper::{CategoryScraper, ScrapeError};
use crate::delivery::retry::{retry_with_backoff, Backoff, RetryPolicy};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Waits between detail page attempts grow by this much per attempt
const PAGE_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Upper bound of a single wait between detail page attempts
const PAGE_BACKOFF_CAP: Duration = Duration::from_millis(5_000);

/// Builds an HTTP client for page fetching
///
/// # Example
///
/// ```
/// use event_sweep::config::ScraperConfig;
/// use event_sweep::crawler::build_page_client;
///
/// let client = build_page_client(&ScraperConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_page_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body, treating any non-2xx status as an error
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| ScrapeError::Http {
        url: url.to_string(),
        source,
    })
}

/// Browsing context shared by all units of one location
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    location: String,
}

impl HttpSession {
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Scrapes listing and detail pages with plain HTTP requests
#[derive(Debug, Clone)]
pub struct HtmlCategoryScraper {
    config: ScraperConfig,
}

impl HtmlCategoryScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Retry policy used for a single detail page
    pub fn page_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.page_max_attempts,
            attempt_timeout: Duration::from_millis(self.config.page_attempt_timeout_ms),
            backoff: Backoff::new(PAGE_BACKOFF_BASE, PAGE_BACKOFF_CAP),
        }
    }

    async fn load_listing(&self, client: &Client, url: &str) -> Result<String, ScrapeError> {
        let timeout = Duration::from_millis(self.config.listing_timeout_ms);
        match tokio::time::timeout(timeout, fetch_page(client, url)).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn load_detail(
        &self,
        client: &Client,
        policy: &RetryPolicy,
        url: &str,
    ) -> Result<String, ScrapeError> {
        retry_with_backoff(policy, url, |_| fetch_page(client, url))
            .await
            .map_err(|exhausted| ScrapeError::PageLoad {
                url: url.to_string(),
                attempts: exhausted.attempts,
                reason: exhausted.last_error.to_string(),
            })
    }
}

#[async_trait]
impl CategoryScraper for HtmlCategoryScraper {
    type Session = HttpSession;

    async fn open_session(&self, location: &str) -> Result<HttpSession, ScrapeError> {
        let client = build_page_client(&self.config).map_err(|e| ScrapeError::Session {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Opened HTTP session for {}", location);
        Ok(HttpSession {
            client,
            location: location.to_string(),
        })
    }

    async fn scrape_category(
        &self,
        session: &HttpSession,
        category_url: &str,
        unit: &WorkUnit,
    ) -> Result<Vec<EventRecord>, ScrapeError> {
        let base = Url::parse(category_url)
            .map_err(|e| ScrapeError::Other(format!("Bad category URL {}: {}", category_url, e)))?;

        let listing = self.load_listing(&session.client, category_url).await?;
        let links = extract_event_links(&listing, &base, &self.config.link_pattern);
        tracing::info!("Found {} links on listing {}", links.len(), category_url);

        let policy = self.page_policy();
        let mut events = Vec::new();
        let mut consecutive_failures = 0u32;

        for link in links {
            if events.len() >= self.config.max_events_per_category {
                break;
            }

            match self.load_detail(&session.client, &policy, &link).await {
                Ok(html) => {
                    consecutive_failures = 0;
                    let record = extract_event(&html, &link, unit);
                    tracing::debug!(
                        "Scraped event: {}",
                        record.title.as_deref().unwrap_or(&link)
                    );
                    events.push(record);
                }
                Err(e) => {
                    tracing::error!("Failed to load event {}: {}", link, e);
                    consecutive_failures += 1;
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        tracing::warn!(
                            "{} consecutive event failures, abandoning listing {}",
                            consecutive_failures,
                            category_url
                        );
                        break;
                    }
                }
            }
        }

        Ok(events)
    }

    async fn close_session(&self, session: HttpSession) {
        tracing::debug!("Closed HTTP session for {}", session.location);
    }
}
