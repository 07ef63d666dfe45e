//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by route
//! - `gateway_auth_failures_total` (counter): authentication failures by reason
//! - `gateway_revocations_total` (counter): revoke calls
//! - `gateway_revocation_entries` (gauge): entries held by the revocation store
//! - `gateway_revocations_swept_total` (counter): entries removed by the sweeper
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed recorder
//!   every call is a no-op, so tests need no setup
//! - Requests that match no route are labelled `route="none"`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(elapsed);
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_revocation(entries: usize) {
    ::metrics::counter!("gateway_revocations_total").increment(1);
    ::metrics::gauge!("gateway_revocation_entries").set(entries as f64);
}

pub fn record_revocation_sweep(removed: usize, remaining: usize) {
    ::metrics::counter!("gateway_revocations_swept_total").increment(removed as u64);
    ::metrics::gauge!("gateway_revocation_entries").set(remaining as f64);
}
