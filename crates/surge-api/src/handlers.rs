//! HTTP handlers.
//!
//! Application handlers answer with small JSON bodies. Only admission can
//! be refused, and a refusal is a `503` so load balancers and load-test
//! clients see backpressure directly.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info};

use surge_metrics::ServiceMetrics;

use crate::AppState;

const QUEUE_FULL_MESSAGE: &str = "Queue is full, request dropped";

/// Outcome of a `/load/http` burst.
#[derive(Debug, Serialize)]
struct BurstResponse {
    message: String,
    admitted: usize,
    rejected: usize,
}

fn message(msg: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": msg }))
}

// ── Application ────────────────────────────────────────────────

/// GET /
///
/// Refreshes the gauges, then admits one request. `http_requests_total` is
/// the queue's admission count, so a `503` from here leaves it unchanged;
/// rejected requests are not counted.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    // Gauges follow request traffic as well as scrapes.
    state.metrics.snapshot();

    match state.queue.try_admit() {
        Ok(()) => message("Hello from HPA Demo!").into_response(),
        Err(e) => {
            debug!(error = %e, "request dropped");
            (StatusCode::SERVICE_UNAVAILABLE, message(QUEUE_FULL_MESSAGE)).into_response()
        }
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// GET /metrics
pub async fn metrics_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

// ── Load generation ────────────────────────────────────────────

/// GET /load/cpu
pub async fn load_cpu(State(state): State<AppState>) -> impl IntoResponse {
    match state.load.start_cpu() {
        // Detached: the worker outlives the request and stops on shutdown.
        Ok(_handle) => {
            info!(workers = state.load.cpu_workers(), "cpu load requested");
            message("CPU load started").into_response()
        }
        Err(e) => {
            error!(error = %e, "cpu load worker failed to start");
            (StatusCode::INTERNAL_SERVER_ERROR, message(&e.to_string())).into_response()
        }
    }
}

/// GET /load/memory
pub async fn load_memory(State(state): State<AppState>) -> impl IntoResponse {
    match state.load.start_memory() {
        Ok(_handle) => {
            info!(
                held_bytes = state.load.memory_bytes(),
                "memory load requested"
            );
            message("Memory load started").into_response()
        }
        Err(e) => {
            error!(error = %e, "memory load worker failed to start");
            (StatusCode::INTERNAL_SERVER_ERROR, message(&e.to_string())).into_response()
        }
    }
}

/// GET /load/http
///
/// Attempts `http_burst` admissions back to back without waiting for the
/// drain loop, so anything beyond the free capacity is rejected.
pub async fn load_http(State(state): State<AppState>) -> impl IntoResponse {
    let mut admitted = 0;
    for _ in 0..state.http_burst {
        if state.queue.try_admit().is_ok() {
            admitted += 1;
        }
    }
    let rejected = state.http_burst - admitted;

    info!(admitted, rejected, queue = state.queue.size(), "http load burst");

    if admitted == 0 {
        let body = BurstResponse {
            message: QUEUE_FULL_MESSAGE.to_string(),
            admitted,
            rejected,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    Json(BurstResponse {
        message: format!("{admitted} HTTP requests queued"),
        admitted,
        rejected,
    })
    .into_response()
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics on the scrape listener
pub async fn prometheus_metrics(State(metrics): State<Arc<ServiceMetrics>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render(),
    )
}
