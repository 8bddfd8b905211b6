//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define balancer metrics (requests, latency, connections, liveness)
//! - Install the Prometheus recorder whose handle renders the scrape endpoint
//! - Track per-backend and aggregate metrics
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests routed, by backend
//! - `lb_request_duration_seconds` (histogram): time until the response body finished, by backend
//! - `lb_active_connections` (gauge): in-flight requests, by backend
//! - `lb_unavailable_requests_total` (counter): requests rejected with no alive backend
//! - `lb_backend_up` (gauge): 1=alive, 0=dead, by backend
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Histogram buckets are the Prometheus client defaults

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "lb_requests_total";
pub const REQUEST_DURATION: &str = "lb_request_duration_seconds";
pub const ACTIVE_CONNECTIONS: &str = "lb_active_connections";
pub const UNAVAILABLE_TOTAL: &str = "lb_unavailable_requests_total";
pub const BACKEND_UP: &str = "lb_backend_up";

const DEFAULT_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Install the global Prometheus recorder.
///
/// Can only succeed once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DEFAULT_BUCKETS)?
        .install_recorder()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of requests handled by load balancer.");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "Duration of requests handled by load balancer."
    );
    metrics::describe_gauge!(ACTIVE_CONNECTIONS, "Requests currently in flight to a backend.");
    metrics::describe_counter!(UNAVAILABLE_TOTAL, "Requests rejected because no backend was alive.");
    metrics::describe_gauge!(BACKEND_UP, "Backend liveness from the latest health probe.");

    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

pub fn record_selection(backend: &str) {
    counter!(REQUESTS_TOTAL, "backend" => backend.to_string()).increment(1);
}

pub fn record_completion(backend: &str, elapsed: Duration) {
    histogram!(REQUEST_DURATION, "backend" => backend.to_string()).record(elapsed.as_secs_f64());
}

pub fn set_active_connections(backend: &str, active: usize) {
    gauge!(ACTIVE_CONNECTIONS, "backend" => backend.to_string()).set(active as f64);
}

pub fn record_unavailable() {
    counter!(UNAVAILABLE_TOTAL).increment(1);
}

pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!(BACKEND_UP, "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}
