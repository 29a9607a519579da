//! Postal code, address and error types shared by providers and the race.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Static identifier of a lookup provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProviderId(pub &'static str);

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A non-empty postal code (CEP).
///
/// Surrounding whitespace is trimmed. No format check beyond emptiness is
/// applied; adapters percent-encode the value when they build their URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse raw input, rejecting empty or whitespace-only values.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidPostalCode);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized address returned by whichever provider won the race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub postal_code: String,
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub source_provider: ProviderId,
}

/// Outcome of a single provider lookup.
pub type LookupOutcome = Result<AddressResult, ProviderError>;

/// Why a single provider lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderErrorKind {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Provider answered but flagged the postal code as unknown.
    #[error("postal code not found")]
    NotFound,

    /// Lookup task panicked or was aborted before producing an outcome.
    #[error("lookup task failed: {0}")]
    Task(String),
}

/// A failed lookup, tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider}: {kind}")]
pub struct ProviderError {
    pub provider: ProviderId,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: ProviderId, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Terminal failure of a race.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Empty or missing postal code; no lookups were started.
    #[error("postal code must not be empty")]
    InvalidPostalCode,

    /// Every provider failed before any succeeded.
    #[error("all providers failed: {}", join_failures(.0))]
    AllProvidersFailed(Vec<ProviderError>),

    /// No provider succeeded before the deadline.
    #[error("no provider answered within {}ms", .timeout.as_millis())]
    TimedOut {
        timeout: Duration,
        /// Failures observed before the deadline fired.
        failures: Vec<ProviderError>,
    },
}

impl LookupError {
    /// Provider failures carried by this error, in arrival order.
    pub fn failures(&self) -> &[ProviderError] {
        match self {
            LookupError::InvalidPostalCode => &[],
            LookupError::AllProvidersFailed(failures) => failures,
            LookupError::TimedOut { failures, .. } => failures,
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            LookupError::InvalidPostalCode => "invalid",
            LookupError::AllProvidersFailed(_) => "all_failed",
            LookupError::TimedOut { .. } => "timeout",
        }
    }
}

fn join_failures(failures: &[ProviderError]) -> String {
    if failures.is_empty() {
        return "no providers registered".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
