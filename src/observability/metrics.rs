//! Metrics collection and exposition.
//!
//! # Metrics
//! - `teleport_requests_total` (counter): local requests by route, status
//! - `teleport_binds_total` (counter): successful handoff captures
//! - `teleport_bind_failures_total` (counter): captures refused for missing context
//! - `teleport_tunnel_requests_total` (counter): tunnel requests by outcome
//! - `teleport_knocks_total` (counter): knock probes by outcome
//! - `teleport_station_errors_total` (counter): station serve failures
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16) {
    counter!(
        "teleport_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_bind() {
    counter!("teleport_binds_total").increment(1);
}

pub fn record_bind_failure() {
    counter!("teleport_bind_failures_total").increment(1);
}

pub fn record_tunnel_request(outcome: &'static str) {
    counter!("teleport_tunnel_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_knock(outcome: &'static str) {
    counter!("teleport_knocks_total", "outcome" => outcome).increment(1);
}

pub fn record_station_error() {
    counter!("teleport_station_errors_total").increment(1);
}
