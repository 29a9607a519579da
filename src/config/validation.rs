//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system (startup and reload)

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProviderConfig, ServiceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check every semantic constraint serde cannot express.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.lookup.timeout_ms == 0 {
        errors.push(ValidationError::new("lookup.timeout_ms", "must be greater than zero"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    } else if config.lookup.timeout_ms > 0
        && config.timeouts.request_secs.saturating_mul(1000) <= config.lookup.timeout_ms
    {
        // The inbound timeout would cut the race off before it can report TimedOut.
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed lookup.timeout_ms ({}ms)",
                config.lookup.timeout_ms
            ),
        ));
    }

    let providers = [
        ("providers.brasil_api", &config.providers.brasil_api),
        ("providers.via_cep", &config.providers.via_cep),
    ];
    if providers.iter().all(|(_, p)| !p.enabled) {
        errors.push(ValidationError::new("providers", "at least one provider must be enabled"));
    }
    for (prefix, provider) in providers {
        validate_provider(prefix, provider, &mut errors);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_provider(prefix: &str, provider: &ProviderConfig, errors: &mut Vec<ValidationError>) {
    if provider.request_timeout_ms == 0 {
        errors.push(ValidationError::new(
            format!("{prefix}.request_timeout_ms"),
            "must be greater than zero",
        ));
    }

    let Some(base_url) = &provider.base_url else {
        return;
    };
    match Url::parse(base_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
            format!("{prefix}.base_url"),
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Ok(url) if url.cannot_be_a_base() => errors.push(ValidationError::new(
            format!("{prefix}.base_url"),
            "cannot be used as a base URL",
        )),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            format!("{prefix}.base_url"),
            format!("invalid URL: {e}"),
        )),
    }
}
