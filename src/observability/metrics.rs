//! Metrics collection and exposition.
//!
//! # Metrics
//! - `token_lookups_total` (counter): session lookups by outcome
//!   (found, missing, error, timeout, panic)
//! - `token_refresh_attempts_total` (counter): refresh attempts by outcome
//! - `token_refresh_blocked_total` (counter): refreshes skipped by reason
//! - `auth_failures_total` (counter): 401/403 responses by reason
//! - `api_errors_total` (counter): classified errors by kind
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_token_lookup(outcome: &'static str) {
    metrics::counter!("token_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh_attempt(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("token_refresh_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh_blocked(reason: &'static str) {
    metrics::counter!("token_refresh_blocked_total", "reason" => reason).increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    metrics::counter!("auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_api_error(kind: &'static str) {
    metrics::counter!("api_errors_total", "kind" => kind).increment(1);
}
