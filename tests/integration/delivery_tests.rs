//! Integration tests for callback delivery
//!
//! These tests run the HTTP sink against a wiremock callback and check the
//! attempt budget, the wire format and the replay of persisted batches.

use event_sweep::crawler::EventRecord;
use event_sweep::delivery::{deliver, Backoff, DeliveryError, DeliveryOutcome, DeliveryPolicy, HttpSink};
use event_sweep::storage::{load_failed_batches, replay_failed_batches, write_failed_batch};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(max_retries: u32) -> DeliveryPolicy {
    DeliveryPolicy {
        max_retries,
        timeout_per_attempt: Duration::from_secs(2),
        backoff: Backoff::new(Duration::from_millis(5), Duration::from_millis(10)),
    }
}

fn sink(server: &MockServer, policy: &DeliveryPolicy) -> HttpSink {
    HttpSink::new(format!("{}/hook", server.uri()), policy.timeout_per_attempt)
        .expect("client builds")
}

fn events(n: usize) -> Vec<EventRecord> {
    (0..n)
        .map(|i| EventRecord {
            title: Some(format!("Event {}", i)),
            ..EventRecord::with_link(format!("https://district.in/events/{}", i))
        })
        .collect()
}

#[tokio::test]
async fn test_posts_batch_as_json_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let policy = fast_policy(3);
    let outcome = deliver(&sink(&server, &policy), &events(2), &policy).await;

    assert!(matches!(outcome, DeliveryOutcome::Delivered { count: 2 }));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!([
            {"title": "Event 0", "eventLink": "https://district.in/events/0"},
            {"title": "Event 1", "eventLink": "https://district.in/events/1"}
        ])
    );
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let policy = fast_policy(3);
    let outcome = deliver(&sink(&server, &policy), &[], &policy).await;

    assert!(matches!(outcome, DeliveryOutcome::Delivered { count: 0 }));
}

#[tokio::test]
async fn test_retries_until_callback_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let policy = fast_policy(5);
    let outcome = deliver(&sink(&server, &policy), &events(3), &policy).await;

    assert!(matches!(outcome, DeliveryOutcome::Delivered { count: 3 }));
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let policy = fast_policy(3);
    let outcome = deliver(&sink(&server, &policy), &events(1), &policy).await;

    match outcome {
        DeliveryOutcome::Failed {
            attempts,
            last_error: DeliveryError::Status { status, .. },
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(status, 503);
        }
        other => panic!("expected a status failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_callback_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let policy = DeliveryPolicy {
        timeout_per_attempt: Duration::from_millis(50),
        ..fast_policy(2)
    };
    let outcome = deliver(&sink(&server, &policy), &events(1), &policy).await;

    match outcome {
        DeliveryOutcome::Failed { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected a timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_replay_redelivers_and_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    write_failed_batch(tmp.path(), "pune", "music", &events(2)).await.unwrap();
    write_failed_batch(tmp.path(), "goa", "comedy", &events(1)).await.unwrap();

    let policy = fast_policy(2);
    let summary = replay_failed_batches(tmp.path(), &sink(&server, &policy), &policy)
        .await
        .unwrap();

    assert_eq!(summary.delivered_batches, 2);
    assert_eq!(summary.delivered_events, 3);
    assert_eq!(summary.failed_batches, 0);
    assert!(load_failed_batches(tmp.path()).await.unwrap().is_empty());
}
