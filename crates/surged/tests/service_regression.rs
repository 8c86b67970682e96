//! Service regression tests.
//!
//! Assembles the routers, queue, and drain loop the way the daemon does and
//! drives them over HTTP with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use surge_api::{AppState, build_metrics_router, build_router};
use surge_core::{LoadConfig, ServiceConfig};
use surge_load::LoadGenerator;
use surge_metrics::{FixedSampler, ServiceMetrics};
use surge_queue::{AdmissionQueue, Drainer};

struct Harness {
    app: Router,
    scrape: Router,
    queue: Arc<AdmissionQueue>,
    load: LoadGenerator,
    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

fn harness(capacity: usize, http_burst: usize) -> Harness {
    let (shutdown, shutdown_rx) = watch::channel(false);
    let queue = Arc::new(AdmissionQueue::new(capacity));
    let metrics = Arc::new(ServiceMetrics::new(
        queue.clone(),
        Arc::new(FixedSampler::new(55.0, 70.0)),
    ));
    let load = LoadGenerator::new(
        LoadConfig {
            http_burst,
            memory_chunk_bytes: 1024,
            ..LoadConfig::default()
        },
        shutdown_rx.clone(),
    );

    let app = build_router(AppState {
        queue: queue.clone(),
        metrics: metrics.clone(),
        load: load.clone(),
        http_burst,
    });
    let scrape = build_metrics_router(metrics);

    Harness {
        app,
        scrape,
        queue,
        load,
        shutdown,
        shutdown_rx,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn health_endpoint() {
    let h = harness(10, 1);
    let (status, json) = get_json(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let h = harness(10, 1);
    let (status, _) = get(&h.app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn burst_fills_queue_then_index_rejects() {
    let h = harness(100, 500);

    let (status, json) = get_json(&h.app, "/load/http").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["admitted"], 100);
    assert_eq!(json["rejected"], 400);

    let (status, json) = get_json(&h.app, "/").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["message"], "Queue is full, request dropped");

    // A second burst against a full queue admits nothing.
    let (status, json) = get_json(&h.app, "/load/http").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["admitted"], 0);
    assert_eq!(json["rejected"], 500);

    let (_, json) = get_json(&h.app, "/metrics").await;
    assert_eq!(json["queue_length"], 100);
    assert_eq!(json["admitted_total"], 100);
    assert_eq!(json["cpu_percent"], 55.0);
    assert_eq!(json["memory_percent"], 70.0);
}

#[tokio::test]
async fn two_slot_scenario_over_http() {
    let h = harness(2, 1);

    assert_eq!(get(&h.app, "/").await.0, StatusCode::OK);
    assert_eq!(get(&h.app, "/").await.0, StatusCode::OK);
    assert_eq!(h.queue.size(), 2);

    assert_eq!(get(&h.app, "/").await.0, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(h.queue.size(), 2);

    assert_eq!(h.queue.drain().map(|t| t.seq()), Some(0));
    assert_eq!(h.queue.size(), 1);

    assert_eq!(get(&h.app, "/").await.0, StatusCode::OK);
    assert_eq!(h.queue.size(), 2);
}

#[tokio::test(start_paused = true)]
async fn drain_loop_frees_capacity_over_time() {
    let h = harness(10, 10);
    let drain = Drainer::new(h.queue.clone(), Duration::from_millis(100), Duration::from_secs(1))
        .spawn(h.shutdown_rx.clone());

    let (_, json) = get_json(&h.app, "/load/http").await;
    assert_eq!(json["admitted"], 10);

    // Ten tokens at 100ms each.
    tokio::time::sleep(Duration::from_millis(1050)).await;
    let (_, json) = get_json(&h.app, "/metrics").await;
    assert_eq!(json["queue_length"], 0);
    assert_eq!(json["processed_total"], 10);
    assert_eq!(json["admitted_total"], 10);

    let (status, json) = get_json(&h.app, "/load/http").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["admitted"], 10);

    h.shutdown.send(true).unwrap();
    drain.await.unwrap();
}

#[tokio::test]
async fn scrape_endpoint_exposes_required_series() {
    let h = harness(10, 3);
    get(&h.app, "/load/http").await;

    for path in ["/", "/metrics"] {
        let (status, text) = get(&h.scrape, path).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains("http_requests_total 3\n"));
        assert!(text.contains("# TYPE cpu_usage gauge"));
        assert!(text.contains("cpu_usage 55\n"));
        assert!(text.contains("# TYPE memory_usage gauge"));
        assert!(text.contains("memory_usage 70\n"));
        assert!(text.contains("# TYPE queue_size gauge"));
        assert!(text.contains("queue_size 3\n"));
    }
}

/// Poll `cond` on real time, failing after five seconds.
async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

#[tokio::test]
async fn load_workers_stop_on_shutdown() {
    let h = harness(10, 1);

    let (status, json) = get_json(&h.app, "/load/memory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Memory load started");

    let (status, json) = get_json(&h.app, "/load/cpu").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "CPU load started");

    eventually("first memory block", || h.load.memory_bytes() >= 1024).await;
    assert_eq!(h.load.memory_workers(), 1);

    // The scrape listener keeps answering while the workers run.
    let (status, _) = get(&h.scrape, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    h.shutdown.send(true).unwrap();
    eventually("memory worker exit", || h.load.memory_workers() == 0).await;
    assert_eq!(h.load.memory_bytes(), 0);
    eventually("cpu worker exit", || h.load.cpu_workers() == 0).await;
}

#[tokio::test]
async fn rejected_index_requests_are_not_scraped_as_requests() {
    let h = harness(1, 1);

    assert_eq!(get(&h.app, "/").await.0, StatusCode::OK);
    assert_eq!(get(&h.app, "/").await.0, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(get(&h.app, "/").await.0, StatusCode::SERVICE_UNAVAILABLE);

    let (_, text) = get(&h.scrape, "/metrics").await;
    assert!(text.contains("http_requests_total 1\n"));
}

#[test]
fn default_config_is_valid() {
    let config = ServiceConfig::default();
    config.validate().unwrap();
    assert_eq!(config.metrics_listen.port(), 8000);
}
