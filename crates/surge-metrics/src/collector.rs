//! Service metrics — the admission counter plus point-in-time gauges.
//!
//! Nothing here is cached between reads: every [`ServiceMetrics::snapshot`]
//! samples the host and the queue again and writes the results into the
//! exported gauges.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::trace;

use surge_queue::AdmissionQueue;

use crate::prometheus::render_prometheus;
use crate::system::SystemSampler;

/// A gauge holding an `f64`, stored as raw bits for lock-free access.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0f64.to_bits()))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Combined view of the service at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Tokens waiting in the admission queue.
    #[serde(rename = "queue_length")]
    pub current_occupancy: usize,
    pub admitted_total: u64,
    pub processed_total: u64,
    pub capacity: usize,
}

/// Owns the exported gauges and knows where to sample them from.
pub struct ServiceMetrics {
    queue: Arc<AdmissionQueue>,
    sampler: Arc<dyn SystemSampler>,
    cpu_usage: Gauge,
    memory_usage: Gauge,
    queue_size: Gauge,
}

impl ServiceMetrics {
    pub fn new(queue: Arc<AdmissionQueue>, sampler: Arc<dyn SystemSampler>) -> Self {
        Self {
            queue,
            sampler,
            cpu_usage: Gauge::new(),
            memory_usage: Gauge::new(),
            queue_size: Gauge::new(),
        }
    }

    /// Sample everything now and update the gauges to match.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let snapshot = MetricsSnapshot {
            cpu_percent: self.sampler.sample_cpu(),
            memory_percent: self.sampler.sample_memory(),
            current_occupancy: self.queue.size(),
            admitted_total: self.queue.admitted_total(),
            processed_total: self.queue.processed_total(),
            capacity: self.queue.capacity(),
        };

        self.cpu_usage.set(snapshot.cpu_percent);
        self.memory_usage.set(snapshot.memory_percent);
        self.queue_size.set(snapshot.current_occupancy as f64);

        trace!(
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            queue = snapshot.current_occupancy,
            "metrics sampled"
        );
        snapshot
    }

    /// Fresh snapshot rendered as Prometheus text.
    pub fn render(&self) -> String {
        render_prometheus(&self.snapshot())
    }

    pub fn cpu_usage(&self) -> f64 {
        self.cpu_usage.get()
    }

    pub fn memory_usage(&self) -> f64 {
        self.memory_usage.get()
    }

    pub fn queue_size(&self) -> f64 {
        self.queue_size.get()
    }

    pub fn queue(&self) -> &Arc<AdmissionQueue> {
        &self.queue
    }
}
