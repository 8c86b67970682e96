//! surge-api — HTTP surface of the surge service.
//!
//! Two routers, served on separate listeners:
//!
//! # Application routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Refresh gauges, admit one request, 503 when the queue is full |
//! | GET | `/health` | Liveness |
//! | GET | `/metrics` | JSON snapshot: cpu, memory, queue length, counters |
//! | GET | `/load/cpu` | Start a CPU load worker |
//! | GET | `/load/memory` | Start a memory load worker |
//! | GET | `/load/http` | Attempt a burst of admissions |
//!
//! # Scrape routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` or `/metrics` | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use surge_load::LoadGenerator;
use surge_metrics::ServiceMetrics;
use surge_queue::AdmissionQueue;

/// Shared state for application handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<AdmissionQueue>,
    pub metrics: Arc<ServiceMetrics>,
    pub load: LoadGenerator,
    /// Admissions attempted per `/load/http` call.
    pub http_burst: usize,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_json))
        .route("/load/cpu", get(handlers::load_cpu))
        .route("/load/memory", get(handlers::load_memory))
        .route("/load/http", get(handlers::load_http))
        .with_state(state)
}

/// Build the router for the dedicated scrape listener.
pub fn build_metrics_router(metrics: Arc<ServiceMetrics>) -> Router {
    Router::new()
        .route("/", get(handlers::prometheus_metrics))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(metrics)
}
