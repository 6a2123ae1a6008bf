//! Event records produced by the category scraper

use crate::url::canonical_link;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scraped event
///
/// Known fields are typed; anything else a scraper produces is kept in
/// `extra` and serialized alongside them, so records survive a
/// deserialize/serialize cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Link to the event detail page; the record's identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_link: Option<String>,

    /// Description paragraphs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Venue as printed on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// RFC 3339 timestamp of extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,

    /// Location slug of the work unit that produced the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_tab: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraping_source: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Creates a record that only carries a link
    pub fn with_link(link: impl Into<String>) -> Self {
        Self {
            event_link: Some(link.into()),
            ..Self::default()
        }
    }

    /// Returns the deduplication identity: the canonical form of `eventLink`
    ///
    /// `None` when the record has no usable link; such records are never
    /// treated as duplicates.
    pub fn identity(&self) -> Option<String> {
        self.event_link.as_deref().and_then(canonical_link)
    }
}
