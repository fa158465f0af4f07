//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): use-case outcomes
//! - `gateway_backend_calls_total` (counter): outbound calls by service, operation, outcome
//! - `gateway_circuit_rejections_total` (counter): calls refused by an open circuit
//! - `gateway_retry_queue_depth` (gauge): deferred corrections waiting
//! - `gateway_retry_attempts_total` (counter): drain-loop attempts by outcome
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_use_case(use_case: &'static str, outcome: &'static str) {
    counter!("gateway_requests_total", "use_case" => use_case, "outcome" => outcome).increment(1);
}

pub fn record_backend_call(service: &'static str, operation: &str, outcome: &'static str) {
    counter!(
        "gateway_backend_calls_total",
        "service" => service,
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_circuit_rejection(operation: &str) {
    counter!("gateway_circuit_rejections_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_retry_queue_depth(depth: usize) {
    gauge!("gateway_retry_queue_depth").set(depth as f64);
}

pub fn record_retry_attempt(success: bool) {
    let outcome = if success { "ok" } else { "requeued" };
    counter!("gateway_retry_attempts_total", "outcome" => outcome).increment(1);
}
