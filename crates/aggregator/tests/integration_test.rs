//! End-to-end tests driving the full router with `tower::ServiceExt::oneshot`,
//! one isolated `DATABASE_FILE` per test. `Router` is `Clone`, so a single
//! built app is reused across calls within a test via `app.clone().oneshot(...)`;
//! a fresh call to `aggregator::build` against the same file simulates a
//! process restart.
//!
//! `DATABASE_FILE` is a process-global env var re-read on every store
//! access (see `aggregator_common::db::database_file`), so every test
//! here is `#[serial]` — run concurrently they'd race on which
//! tempdir's database the next store call actually resolves to.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use serial_test::serial;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    _dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aggregator.db");
    unsafe {
        std::env::set_var("DATABASE_FILE", &path);
    }

    let (router, consumer) = aggregator::build(1_000).await.unwrap();
    tokio::spawn(consumer.run());

    TestApp { router, _dir: dir }
}

/// Build a fresh router + Consumer against the same `DATABASE_FILE`,
/// simulating a process restart: the durable store survives, the
/// Stats Model's ephemeral fields reset to zero.
async fn restart(app: &TestApp) -> Router {
    let (router, consumer) = aggregator::build(1_000).await.unwrap();
    tokio::spawn(consumer.run());
    let _ = &app._dir; // keep the tempdir alive for the caller
    router
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn publish_request(events: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/publish")
        .header("content-type", "application/json")
        .body(Body::from(events.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn wait_for_queue_drain() {
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
}

#[tokio::test]
#[serial]
async fn cold_start_stats_are_zeroed() {
    let app = spawn_app().await;

    let response = app.router.clone().oneshot(get_request("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["received"], 0);
    assert_eq!(body["unique_processed"], 0);
    assert_eq!(body["duplicate_dropped"], 0);
    assert_eq!(body["topics"], json!([]));
    assert!(body["uptime"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
#[serial]
async fn listing_an_unknown_topic_returns_an_empty_list() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/events?topic=test-topic"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["topic"], "test-topic");
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
#[serial]
async fn publishing_a_single_valid_event_reports_the_queued_count() {
    let app = spawn_app().await;

    let event = json!({
        "topic": "t",
        "event_id": "id-valid-1",
        "timestamp": "2026-07-27T00:00:00Z",
        "source": "test",
        "payload": {},
    });

    let response = app.router.clone().oneshot(publish_request(json!([event]))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, json!({"status": "events queued", "count": 1}));
}

#[tokio::test]
#[serial]
async fn empty_batch_is_rejected() {
    let app = spawn_app().await;

    let response = app.router.clone().oneshot(publish_request(json!([]))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Event list tidak boleh kosong");
}

#[tokio::test]
#[serial]
async fn malformed_event_is_rejected_with_422() {
    let app = spawn_app().await;

    let malformed = json!([{"topic": "t"}]);
    let response = app.router.clone().oneshot(publish_request(malformed)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[serial]
async fn single_duplicate_is_counted_and_dropped() {
    let app = spawn_app().await;

    let event = json!({
        "topic": "t",
        "event_id": "a",
        "timestamp": "2026-07-27T00:00:00Z",
        "source": "test",
        "payload": {"k": "v"},
    });

    let first = app.router.clone().oneshot(publish_request(json!([event.clone()]))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.router.clone().oneshot(publish_request(json!([event]))).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    wait_for_queue_drain().await;

    let stats = json_body(app.router.clone().oneshot(get_request("/stats")).await.unwrap()).await;
    assert_eq!(stats["received"], 2);
    assert_eq!(stats["unique_processed"], 1);
    assert_eq!(stats["duplicate_dropped"], 1);

    let events = json_body(
        app.router.clone().oneshot(get_request("/events?topic=t")).await.unwrap(),
    )
    .await;
    assert_eq!(events["events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn batch_with_duplicates_counts_each_outcome() {
    let app = spawn_app().await;

    let e1 = json!({"topic": "t", "event_id": "id-batch-1", "timestamp": "2026-07-27T00:00:00Z", "source": "s", "payload": {}});
    let e2 = json!({"topic": "t", "event_id": "id-batch-2", "timestamp": "2026-07-27T00:00:00Z", "source": "s", "payload": {}});

    let batch = json!([e1, e2, e1, e1, e2]);
    let response = app.router.clone().oneshot(publish_request(batch)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_queue_drain().await;

    let stats = json_body(app.router.clone().oneshot(get_request("/stats")).await.unwrap()).await;
    assert_eq!(stats["received"], 5);
    assert_eq!(stats["unique_processed"], 2);
    assert_eq!(stats["duplicate_dropped"], 3);

    let events = json_body(
        app.router.clone().oneshot(get_request("/events?topic=t")).await.unwrap(),
    )
    .await;
    assert_eq!(events["events"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn restart_survives_dedup_across_process_lifetimes() {
    let app = spawn_app().await;

    let event = json!({
        "topic": "test-topic",
        "event_id": "id-persist-1",
        "timestamp": "2026-07-27T00:00:00Z",
        "source": "s",
        "payload": {},
    });

    let response = app.router.clone().oneshot(publish_request(json!([event.clone()]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_queue_drain().await;

    let restarted = restart(&app).await;
    let stats = json_body(restarted.clone().oneshot(get_request("/stats")).await.unwrap()).await;
    assert_eq!(stats["unique_processed"], 1);
    assert_eq!(stats["topics"], json!(["test-topic"]));
    assert_eq!(stats["received"], 0);
    assert_eq!(stats["duplicate_dropped"], 0);

    let republish = restarted.clone().oneshot(publish_request(json!([event]))).await.unwrap();
    assert_eq!(republish.status(), StatusCode::OK);
    wait_for_queue_drain().await;

    let final_stats = json_body(restarted.clone().oneshot(get_request("/stats")).await.unwrap()).await;
    assert_eq!(final_stats["received"], 1);
    assert_eq!(final_stats["unique_processed"], 1);
    assert_eq!(final_stats["duplicate_dropped"], 1);
}

#[tokio::test]
#[serial]
async fn load_with_duplicates_preserves_conservation_and_responsiveness() {
    let app = spawn_app().await;

    let distinct = 400usize;
    let duplicate_draws = 100usize;
    let batch_size = 100usize;

    let mut events: Vec<Value> = (0..distinct)
        .map(|i| {
            json!({
                "topic": "load",
                "event_id": format!("id-{i}"),
                "timestamp": "2026-07-27T00:00:00Z",
                "source": "load-test",
                "payload": {},
            })
        })
        .collect();

    for i in 0..duplicate_draws {
        events.push(events[i % distinct].clone());
    }

    let mut stats_checked_during_load = false;
    for chunk in events.chunks(batch_size) {
        let response = app
            .router
            .clone()
            .oneshot(publish_request(json!(chunk)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats_response = app.router.clone().oneshot(get_request("/stats")).await.unwrap();
        assert_eq!(stats_response.status(), StatusCode::OK);
        stats_checked_during_load = true;
    }
    assert!(stats_checked_during_load);

    wait_for_queue_drain().await;

    let stats = json_body(app.router.clone().oneshot(get_request("/stats")).await.unwrap()).await;
    assert_eq!(stats["unique_processed"], distinct as u64);
    assert_eq!(stats["duplicate_dropped"], duplicate_draws as u64);
}

#[tokio::test]
#[serial]
async fn health_check_reports_ok() {
    let app = spawn_app().await;

    let response = app.router.clone().oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}
