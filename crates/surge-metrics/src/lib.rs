//! surge-metrics — observability for the surge service.
//!
//! Combines the admission queue's counters with host CPU and memory
//! samples into a [`MetricsSnapshot`], keeps the exported gauges current,
//! and renders Prometheus text exposition.
//!
//! # Architecture
//!
//! ```text
//! ServiceMetrics
//!   ├── AdmissionQueue  → admitted_total, size()
//!   ├── SystemSampler   → sample_cpu(), sample_memory()
//!   ├── snapshot()      → fresh MetricsSnapshot, gauges updated
//!   └── render()        → text/plain for the scrape listener
//! ```

pub mod collector;
pub mod prometheus;
pub mod system;

pub use collector::{Gauge, MetricsSnapshot, ServiceMetrics};
pub use prometheus::render_prometheus;
pub use system::{FixedSampler, ProcSampler, SystemSampler};
