//! HTML parser for listing and detail pages
//!
//! This module handles parsing HTML content to extract:
//! - Event links from a category listing page
//! - Structured event fields from an event detail page

use crate::crawler::record::EventRecord;
use crate::crawler::scheduler::WorkUnit;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the unique event links of a listing page, in document order
///
/// An anchor counts as an event link when its resolved absolute URL
/// contains `pattern`.
///
/// # Example
///
/// ```
/// use event_sweep::crawler::extract_event_links;
/// use url::Url;
///
/// let html = r#"<a href="/events/gig">Gig</a><a href="/about">About</a>"#;
/// let base = Url::parse("https://district.in/music-in-pune-book-tickets").unwrap();
/// let links = extract_event_links(html, &base, "/events/");
/// assert_eq!(links, vec!["https://district.in/events/gig".to_string()]);
/// ```
pub fn extract_event_links(html: &str, base_url: &Url, pattern: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(absolute_url) = resolve_link(href, base_url) {
            if absolute_url.contains(pattern) && seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for javascript:, mailto:, tel: and data: links, for
/// fragment-only anchors and for anything that does not resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Builds an event record from a detail page
///
/// Every field is best effort: a selector that matches nothing leaves the
/// field unset. The link, the work unit's location, tab and subcategory, and
/// the extraction time are always filled in.
pub fn extract_event(html: &str, link: &str, unit: &WorkUnit) -> EventRecord {
    let document = Html::parse_document(html);

    let description =
        first_match(&document, &[".description", ".event-desc"]).map(|el| collect_texts(el, "p"));
    let tags = select_texts(&document, ".tags .tag");

    EventRecord {
        title: first_text(&document, &["h1", ".event-title", ".title"]),
        category: Some(unit.sub_category.clone()),
        event_date: first_text(&document, &[".date", ".event-date"]),
        event_time: first_text(&document, &[".time"]),
        image: first_attr(&document, &["img", ".hero img"], "src"),
        price: first_text(&document, &[".price"]),
        event_link: Some(link.to_string()),
        description,
        tags: if tags.is_empty() { None } else { Some(tags) },
        location: first_text(&document, &[".location", ".venue"]),
        scraped_at: Some(chrono::Utc::now().to_rfc3339()),
        scraped_location: Some(unit.location.clone()),
        category_tab: Some(unit.category_tab.as_str().to_string()),
        scraping_source: source_of(link),
        ..EventRecord::default()
    }
}

/// Host of the link without a leading `www.`
fn source_of(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn first_match<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next()
    })
}

/// Trimmed text of the first element matched by the first selector that yields non-empty text
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
    })
}

fn first_attr(document: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn select_texts(document: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn collect_texts(element: ElementRef<'_>, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    element
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text content with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
