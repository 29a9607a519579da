//! Provider adapters.
//!
//! # Responsibilities
//! - Define the [`ProviderClient`] capability the race is built on
//! - Build one adapter per enabled provider from configuration
//! - Share a single HTTP client (connection pool) across adapters
//!
//! # Data Flow
//! ```text
//! PostalCode
//!     → adapter builds URL (postal code as a path segment)
//!     → transport.rs (one GET, status check, JSON decode)
//!     → adapter maps provider fields into AddressResult
//! ```

pub mod brasil_api;
pub mod transport;
pub mod via_cep;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::config::{ProviderConfig, ProvidersConfig};
use crate::lookup::{LookupOutcome, PostalCode, ProviderId};

pub use brasil_api::BrasilApi;
pub use via_cep::ViaCep;

/// A single external address-lookup service.
///
/// Implementations perform exactly one outbound request per call and never
/// panic on provider misbehaviour: every failure is returned as
/// `Err(ProviderError)`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn lookup(&self, postal_code: &PostalCode) -> LookupOutcome;
}

/// Errors raised while building adapters from configuration.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    #[error("{provider}: invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        provider: ProviderId,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{provider}: '{url}' cannot be used as a base URL")]
    UnsupportedBaseUrl { provider: ProviderId, url: String },

    #[error("HTTP client could not be constructed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Build the shared HTTP client used by every adapter.
pub fn http_client() -> Result<reqwest::Client, ProviderBuildError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("cep-race/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Build an adapter for every enabled provider, in race registration order.
pub fn build_providers(
    config: &ProvidersConfig,
) -> Result<Vec<Arc<dyn ProviderClient>>, ProviderBuildError> {
    let client = http_client()?;
    let mut providers: Vec<Arc<dyn ProviderClient>> = Vec::new();

    if config.brasil_api.enabled {
        let cfg = &config.brasil_api;
        let base_url = base_url(BrasilApi::ID, cfg, BrasilApi::DEFAULT_BASE_URL)?;
        providers.push(Arc::new(BrasilApi::new(client.clone(), base_url, request_timeout(cfg))));
    }

    if config.via_cep.enabled {
        let cfg = &config.via_cep;
        let base_url = base_url(ViaCep::ID, cfg, ViaCep::DEFAULT_BASE_URL)?;
        providers.push(Arc::new(ViaCep::new(client.clone(), base_url, request_timeout(cfg))));
    }

    tracing::debug!(
        providers = ?providers.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
        "Providers built"
    );
    Ok(providers)
}

fn base_url(
    provider: ProviderId,
    config: &ProviderConfig,
    default: &str,
) -> Result<Url, ProviderBuildError> {
    let raw = config.base_url.as_deref().unwrap_or(default);
    let url = Url::parse(raw).map_err(|source| ProviderBuildError::InvalidBaseUrl {
        provider,
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ProviderBuildError::UnsupportedBaseUrl {
            provider,
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn request_timeout(config: &ProviderConfig) -> Duration {
    Duration::from_millis(config.request_timeout_ms)
}

/// Append `segments` to the path of `base`, percent-encoding each one.
pub(crate) fn endpoint<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_providers() {
        let providers = build_providers(&ProvidersConfig::default()).unwrap();
        let ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![BrasilApi::ID, ViaCep::ID]);
    }

    #[test]
    fn test_disabled_providers_are_skipped() {
        let mut config = ProvidersConfig::default();
        config.brasil_api.enabled = false;
        let providers = build_providers(&config).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id(), ViaCep::ID);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let mut config = ProvidersConfig::default();
        config.via_cep.base_url = Some("data:text/plain,hello".into());
        let err = build_providers(&config).err().unwrap();
        assert!(matches!(err, ProviderBuildError::UnsupportedBaseUrl { .. }));

        config.via_cep.base_url = Some("not a url".into());
        let err = build_providers(&config).err().unwrap();
        assert!(matches!(err, ProviderBuildError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            endpoint(&base, ["api", "cep", "v1", "01001000"]).as_str(),
            "https://example.com/api/cep/v1/01001000"
        );

        let base = Url::parse("http://example.com/prefix/").unwrap();
        assert_eq!(
            endpoint(&base, ["ws", "01001/000?x=1", "json", ""]).as_str(),
            "http://example.com/prefix/ws/01001%2F000%3Fx=1/json/"
        );
    }
}
