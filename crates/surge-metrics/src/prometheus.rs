//! Prometheus text exposition format.
//!
//! Renders a metrics snapshot for scraping by a Prometheus server or
//! compatible agent. The series names are what the autoscaler's adapter
//! queries, so they must not change.

use crate::collector::MetricsSnapshot;

/// Render a snapshot into Prometheus text format.
///
/// Produces unlabelled COUNTER and GAUGE series.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    out.push_str("# HELP http_requests_total Total HTTP requests\n");
    out.push_str("# TYPE http_requests_total counter\n");
    out.push_str(&format!("http_requests_total {}\n", snapshot.admitted_total));

    out.push_str("# HELP cpu_usage Current CPU usage percentage\n");
    out.push_str("# TYPE cpu_usage gauge\n");
    out.push_str(&format!("cpu_usage {}\n", snapshot.cpu_percent));

    out.push_str("# HELP memory_usage Current memory usage percentage\n");
    out.push_str("# TYPE memory_usage gauge\n");
    out.push_str(&format!("memory_usage {}\n", snapshot.memory_percent));

    out.push_str("# HELP queue_size Current number of requests in the queue\n");
    out.push_str("# TYPE queue_size gauge\n");
    out.push_str(&format!("queue_size {}\n", snapshot.current_occupancy));

    out.push_str("# HELP queue_processed_total Requests taken off the queue and processed\n");
    out.push_str("# TYPE queue_processed_total counter\n");
    out.push_str(&format!("queue_processed_total {}\n", snapshot.processed_total));

    out
}
