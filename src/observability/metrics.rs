//! Metrics collection and exposition.
//!
//! # Metrics
//! - `healthz_requests_total` (counter): requests by route pattern, status
//! - `healthz_request_duration_seconds` (histogram): handler latency
//!
//! Recording is a no-op until a recorder is installed, so handlers can
//! record unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!("healthz_requests_total", "Total number of requests served");
            describe_histogram!(
                "healthz_request_duration_seconds",
                "Request handling duration in seconds"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record one served request. `path` is the matched route pattern, never
/// the raw request path.
pub fn record_request(path: &str, status: u16, start: Instant) {
    counter!(
        "healthz_requests_total",
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("healthz_request_duration_seconds", "path" => path.to_string())
        .record(start.elapsed().as_secs_f64());
}
