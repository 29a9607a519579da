//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cep_provider_lookups_total` (counter): lookups by provider, result
//! - `cep_provider_lookup_duration_seconds` (histogram): per-provider latency
//! - `cep_resolutions_total` (counter): races by terminal outcome
//! - `cep_resolution_duration_seconds` (histogram): race latency by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lookup::{LookupError, LookupOutcome, ProviderId};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the completion of a single provider lookup.
pub fn record_provider_lookup(provider: ProviderId, outcome: &LookupOutcome, elapsed: Duration) {
    let result = if outcome.is_ok() { "success" } else { "failure" };
    metrics::counter!(
        "cep_provider_lookups_total",
        "provider" => provider.as_str(),
        "result" => result
    )
    .increment(1);
    metrics::histogram!(
        "cep_provider_lookup_duration_seconds",
        "provider" => provider.as_str()
    )
    .record(elapsed.as_secs_f64());
}

/// Record the terminal state of a race.
pub fn record_resolution<T>(result: &Result<T, LookupError>, elapsed: Duration) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.label(),
    };
    metrics::counter!("cep_resolutions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("cep_resolution_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}
