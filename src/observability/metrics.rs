//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by route, status
//! - `proxy_request_duration_seconds` (histogram): inbound latency by route
//! - `provider_calls_total` (counter): final provider outcomes by provider, outcome
//! - `provider_retries_total` (counter): retries by provider, reason
//!
//! Recording is a no-op until a recorder is installed, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::providers::{CallResult, Provider};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one inbound request.
pub fn record_request(route: String, status: u16, start_time: Instant) {
    metrics::counter!("proxy_requests_total", "route" => route.clone(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record the final outcome of a provider call.
pub fn record_provider_call(provider: Provider, result: &CallResult) {
    let outcome = match result {
        Ok(_) => "success",
        Err(failure) => failure.kind.as_str(),
    };
    metrics::counter!("provider_calls_total", "provider" => provider.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record one retry of a provider call.
pub fn record_retry(provider: Provider, reason: &'static str) {
    metrics::counter!("provider_retries_total", "provider" => provider.as_str(), "reason" => reason)
        .increment(1);
}
