//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_credential_validations_total` (counter): validations by outcome
//! - `gateway_validation_attempts` (histogram): authority calls per validation
//! - `gateway_messages_enqueued_total` (counter): produced messages by topic
//! - `gateway_messages_delivered_total` (counter): drained messages by topic

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, started: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_owned())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_validation(outcome: &'static str, attempts: u32) {
    counter!("gateway_credential_validations_total", "outcome" => outcome).increment(1);
    histogram!("gateway_validation_attempts").record(f64::from(attempts));
}

pub fn record_enqueued(topic: &str) {
    counter!("gateway_messages_enqueued_total", "topic" => topic.to_owned()).increment(1);
}

pub fn record_delivered(topic: &str) {
    counter!("gateway_messages_delivered_total", "topic" => topic.to_owned()).increment(1);
}
