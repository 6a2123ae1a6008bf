//! HTTP-level tests for the crawl trigger
//!
//! The router is exercised directly via tower::ServiceExt::oneshot, with a
//! counting runner standing in for the orchestrator.

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use event_sweep::config::Config;
use event_sweep::crawler::{CrawlRunner, HtmlCategoryScraper, Orchestrator};
use event_sweep::output::{CrawlReport, CrawlStats};
use event_sweep::server::{router, AppState};
use event_sweep::SweepError;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt as _;

const BODY_LIMIT: usize = 1024 * 1024;

type Outcome = Box<dyn Fn() -> event_sweep::Result<CrawlReport> + Send + Sync>;

/// Runner that counts invocations and answers with a canned outcome
struct CountingRunner {
    calls: AtomicUsize,
    outcome: Outcome,
}

impl CountingRunner {
    fn new(outcome: impl Fn() -> event_sweep::Result<CrawlReport> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Box::new(outcome),
        })
    }

    fn succeeding() -> Arc<Self> {
        Self::new(|| {
            Ok(CrawlReport::completed(CrawlStats {
                total_events: 12,
                total_categories: 3,
                total_failed_batches: 1,
            }))
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrawlRunner for CountingRunner {
    async fn run_crawl(&self, _base_url: &str, _callback_url: &str) -> event_sweep::Result<CrawlReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn app(runner: Arc<CountingRunner>) -> Router {
    router(AppState::new(runner))
}

fn scrape_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build POST /scrape")
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[tokio::test]
async fn test_health_returns_ok() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app(CountingRunner::succeeding()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_empty_body_returns_400_without_crawling() {
    let runner = CountingRunner::succeeding();

    let resp = app(runner.clone()).oneshot(scrape_request("{}")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("required"));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_missing_callback_returns_400() {
    let runner = CountingRunner::succeeding();
    let payload = json!({"baseUrl": "https://www.district.in/events"});

    let resp = app(runner.clone())
        .oneshot(scrape_request(&payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_blank_fields_return_400() {
    let runner = CountingRunner::succeeding();
    let payload = json!({"baseUrl": "  ", "callbackUrl": ""});

    let resp = app(runner.clone())
        .oneshot(scrape_request(&payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let runner = CountingRunner::succeeding();

    let resp = app(runner.clone())
        .oneshot(scrape_request("{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await.get("error").is_some());
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_completed_crawl_returns_report() {
    let runner = CountingRunner::succeeding();
    let payload = json!({
        "baseUrl": "https://www.district.in/events",
        "callbackUrl": "https://sink.example.com/hook"
    });

    let resp = app(runner.clone())
        .oneshot(scrape_request(&payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        json_body(resp).await,
        json!({
            "status": "completed",
            "totalEvents": 12,
            "totalCategories": 3,
            "totalFailedBatches": 1
        })
    );
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn test_fatal_crawl_error_returns_500() {
    let runner = CountingRunner::new(|| {
        Err(SweepError::SetupFailed {
            locations: 13,
            last_error: "browser crashed".to_string(),
        })
    });
    let payload = json!({"baseUrl": "https://x.test", "callbackUrl": "https://y.test/hook"});

    let resp = app(runner.clone())
        .oneshot(scrape_request(&payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("browser crashed"));
}

#[tokio::test]
async fn test_rejected_endpoint_returns_400() {
    let scraper = HtmlCategoryScraper::new(Config::default().scraper);
    let orchestrator = Orchestrator::new(Config::default(), scraper).unwrap();
    let app = router(AppState::new(Arc::new(orchestrator)));
    let payload = json!({"baseUrl": "not a url", "callbackUrl": "https://y.test/hook"});

    let resp = app
        .oneshot(scrape_request(&payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("baseUrl"));
}
