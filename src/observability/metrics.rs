//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (request outcomes, latency, decode failures,
//!   bytes saved)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by outcome, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_decode_failures_total` (counter): undecodable origin bodies
//!   by encoding
//! - `proxy_bytes_saved_total` (counter): bytes removed by recompression
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for outcome and status code only, to keep cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and start the scrape endpoint.
pub fn init_metrics(address: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()?;

    describe_counter!(
        "proxy_requests_total",
        "Total requests handled, by outcome and status code"
    );
    describe_histogram!(
        "proxy_request_duration_seconds",
        "End-to-end request latency in seconds"
    );
    describe_counter!(
        "proxy_decode_failures_total",
        "Origin bodies that could not be decoded, by encoding"
    );
    describe_counter!(
        "proxy_bytes_saved_total",
        "Bytes removed from responses by recompression"
    );

    Ok(())
}

/// Record one finished request.
pub fn record_request(outcome: &'static str, status: u16, started: Instant) {
    counter!(
        "proxy_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Record an origin body that could not be decoded.
pub fn record_decode_failure(encoding: String) {
    counter!("proxy_decode_failures_total", "encoding" => encoding).increment(1);
}

/// Record the size reduction achieved on one response.
pub fn record_bytes_saved(bytes: u64) {
    counter!("proxy_bytes_saved_total").increment(bytes);
}
