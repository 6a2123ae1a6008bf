//! URL handling module for Event-Sweep
//!
//! This module provides event link canonicalization (the identity used for
//! deduplication), category listing URL construction and validation of the
//! endpoints a crawl is started with.

mod normalize;

use crate::UrlError;
use url::Url;

pub use normalize::canonicalize;

/// Returns the identity string for an event link
///
/// Links that parse as http(s) URLs are canonicalized; anything else is
/// used trimmed as-is so that two identical opaque links still collide.
/// Returns `None` for a blank link.
///
/// # Examples
///
/// ```
/// use event_sweep::url::canonical_link;
///
/// assert_eq!(
///     canonical_link("https://www.district.in/events/a/"),
///     canonical_link("http://district.in/events/a#info"),
/// );
/// assert_eq!(canonical_link("   "), None);
/// ```
pub fn canonical_link(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match canonicalize(trimmed) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::trace!("Using raw link as identity for {}: {}", trimmed, e);
            Some(trimmed.to_string())
        }
    }
}

/// Builds the listing URL for a subcategory in a location
///
/// The site lays out listings as `<base>/<subcategory>-in-<location>-book-tickets`.
///
/// # Examples
///
/// ```
/// use event_sweep::url::build_category_url;
///
/// let url = build_category_url("https://www.district.in/events/", "mumbai", "Comedy");
/// assert_eq!(url, "https://www.district.in/events/comedy-in-mumbai-book-tickets");
/// ```
pub fn build_category_url(base_url: &str, location: &str, sub_category: &str) -> String {
    format!(
        "{}/{}-in-{}-book-tickets",
        base_url.trim_end_matches('/'),
        sub_category.to_lowercase(),
        location
    )
}

/// Parses an endpoint supplied by a caller, accepting only http(s) URLs with a host
pub fn parse_endpoint(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
