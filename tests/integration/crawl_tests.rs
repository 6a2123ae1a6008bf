//! Integration tests for the crawler
//!
//! These tests use wiremock to serve both the listing site and the
//! callback, and run the full crawl cycle end-to-end with the built-in
//! HTTP scraper.

use event_sweep::config::{CategoriesConfig, Config};
use event_sweep::crawler::{HtmlCategoryScraper, Orchestrator};
use event_sweep::storage::load_failed_batches;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for one location and the given event subcategories
fn create_test_config(subs: &[&str]) -> Config {
    let mut config = Config {
        locations: vec!["pune".to_string()],
        categories: CategoriesConfig {
            activities: vec![],
            events: subs.iter().map(|s| s.to_string()).collect(),
        },
        ..Config::default()
    };
    config.crawler.cooldown_ms = 0;
    config.delivery.max_retries = 2;
    config.delivery.backoff_base_ms = 1;
    config.delivery.backoff_cap_ms = 2;
    config.delivery.timeout_ms = 2_000;
    config.scraper.page_max_attempts = 1;
    config.scraper.page_attempt_timeout_ms = 2_000;
    config.scraper.listing_timeout_ms = 2_000;
    config
}

fn orchestrator(config: Config) -> Orchestrator<HtmlCategoryScraper> {
    let scraper = HtmlCategoryScraper::new(config.scraper.clone());
    Orchestrator::new(config, scraper).expect("valid config")
}

/// Mounts a listing page linking to the given event slugs
async fn mount_listing(server: &MockServer, sub: &str, slugs: &[&str]) {
    let anchors: String = slugs
        .iter()
        .map(|slug| format!(r#"<a href="/events/{}">{}</a>"#, slug, slug))
        .collect();
    let html = format!(
        r#"<html><body><a href="/about">About</a>{}</body></html>"#,
        anchors
    );

    Mock::given(method("GET"))
        .and(path(format!("/{}-in-pune-book-tickets", sub)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

/// Mounts detail pages for the given event slugs
async fn mount_events(server: &MockServer, slugs: &[&str]) {
    for slug in slugs {
        let html = format!(
            r#"<html><body><h1>{}</h1><div class="venue">Pune</div></body></html>"#,
            slug
        );
        Mock::given(method("GET"))
            .and(path(format!("/events/{}", slug)))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(server)
            .await;
    }
}

/// Returns the JSON body of every callback request, in arrival order
async fn callback_batches(server: &MockServer) -> Vec<Vec<Value>> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .into_iter()
        .filter(|req| req.url.path() == "/hook")
        .map(|req| serde_json::from_slice::<Vec<Value>>(&req.body).expect("JSON array body"))
        .collect()
}

fn titles(batch: &[Value]) -> Vec<&str> {
    batch
        .iter()
        .map(|event| event["title"].as_str().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_delivers_scraped_events() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    mount_listing(&site, "music", &["gig-1", "gig-2"]).await;
    mount_events(&site, &["gig-1", "gig-2"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&callback)
        .await;

    let report = orchestrator(create_test_config(&["music"]))
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_events, 2);
    assert_eq!(report.total_categories, 1);
    assert_eq!(report.total_failed_batches, 0);

    let batches = callback_batches(&callback).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(titles(&batches[0]), vec!["gig-1", "gig-2"]);

    let first = &batches[0][0];
    assert_eq!(first["location"], "Pune");
    assert_eq!(first["scrapedLocation"], "pune");
    assert_eq!(first["categoryTab"], "Events");
    assert_eq!(first["category"], "music");
    assert!(first["eventLink"].as_str().unwrap().ends_with("/events/gig-1"));
}

#[tokio::test]
async fn test_cap_delivers_exactly_k_events() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    mount_listing(&site, "music", &["m1", "m2", "m3"]).await;
    mount_listing(&site, "comedy", &["c1", "c2", "c3"]).await;
    mount_listing(&site, "sports", &["s1"]).await;
    mount_events(&site, &["m1", "m2", "m3", "c1", "c2", "c3", "s1"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&callback)
        .await;

    let mut config = create_test_config(&["music", "comedy", "sports"]);
    config.crawler.max_events = Some(4);

    let report = orchestrator(config)
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_events, 4);

    let batches = callback_batches(&callback).await;
    assert_eq!(titles(&batches[0]), vec!["m1", "m2", "m3"]);
    assert_eq!(titles(&batches[1]), vec!["c1"]);

    // no unit starts once the cap is reached
    let requests = site.received_requests().await.unwrap();
    assert!(!requests
        .iter()
        .any(|req| req.url.path() == "/sports-in-pune-book-tickets"));
}

#[tokio::test]
async fn test_duplicate_link_across_units_delivered_once() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    mount_listing(&site, "music", &["shared"]).await;
    mount_listing(&site, "comedy", &["shared", "solo"]).await;
    mount_events(&site, &["shared", "solo"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&callback)
        .await;

    let report = orchestrator(create_test_config(&["music", "comedy"]))
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_events, 2);

    let batches = callback_batches(&callback).await;
    assert_eq!(titles(&batches[0]), vec!["shared"]);
    assert_eq!(titles(&batches[1]), vec!["solo"]);
}

#[tokio::test]
async fn test_failing_callback_persists_the_batch() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let failed_dir = tmp.path().join("failed_batches");

    mount_listing(&site, "music", &["a", "b", "c"]).await;
    mount_events(&site, &["a", "b", "c"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&callback)
        .await;

    let mut config = create_test_config(&["music"]);
    config.persistence.enabled = true;
    config.persistence.directory = failed_dir.to_string_lossy().into_owned();

    let report = orchestrator(config)
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("delivery failures do not fail the crawl");

    assert_eq!(report.total_failed_batches, 1);
    assert_eq!(report.total_events, 0);

    let files = load_failed_batches(&failed_dir).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].record.location, "pune");
    assert_eq!(files[0].record.sub_category, "music");
    assert_eq!(files[0].record.payload.len(), 3);
}

#[tokio::test]
async fn test_consecutive_detail_failures_abandon_listing() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    // only the last two detail pages exist
    mount_listing(&site, "music", &["gone-1", "gone-2", "ok-1", "ok-2"]).await;
    mount_events(&site, &["ok-1", "ok-2"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&callback)
        .await;

    let mut config = create_test_config(&["music"]);
    config.scraper.max_consecutive_failures = 2;

    let report = orchestrator(config)
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_categories, 1);
    assert_eq!(report.total_events, 0);
}

#[tokio::test]
async fn test_listing_error_skips_unit() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/music-in-pune-book-tickets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;
    mount_listing(&site, "comedy", &["joke"]).await;
    mount_events(&site, &["joke"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&callback)
        .await;

    let report = orchestrator(create_test_config(&["music", "comedy"]))
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_categories, 1);
    assert_eq!(report.total_events, 1);
}

#[tokio::test]
async fn test_max_events_per_category_limits_detail_pages() {
    let site = MockServer::start().await;
    let callback = MockServer::start().await;

    mount_listing(&site, "music", &["a", "b", "c"]).await;
    mount_events(&site, &["a", "b", "c"]).await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&callback)
        .await;

    let mut config = create_test_config(&["music"]);
    config.scraper.max_events_per_category = 2;

    let report = orchestrator(config)
        .run(&site.uri(), &format!("{}/hook", callback.uri()))
        .await
        .expect("crawl completes");

    assert_eq!(report.total_events, 2);
    let requests = site.received_requests().await.unwrap();
    assert!(!requests.iter().any(|req| req.url.path() == "/events/c"));
}
