//! Single-shot JSON fetch shared by the adapters.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::lookup::{ProviderError, ProviderErrorKind, ProviderId};

/// Issue one `GET` and decode the body as `T`.
///
/// Transport failures, non-2xx statuses and undecodable bodies are each
/// mapped to their own [`ProviderErrorKind`]. The body is read in full
/// before decoding so a truncated stream surfaces as a transport error.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    provider: ProviderId,
    url: Url,
    timeout: Duration,
) -> Result<T, ProviderError> {
    tracing::debug!(provider = %provider, url = %url, "Querying provider");

    let response = client
        .get(url)
        .timeout(timeout)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| ProviderError::new(provider, ProviderErrorKind::Transport(e.to_string())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::new(provider, ProviderErrorKind::Status(status.as_u16())));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ProviderError::new(provider, ProviderErrorKind::Transport(e.to_string())))?;

    serde_json::from_slice(&body)
        .map_err(|e| ProviderError::new(provider, ProviderErrorKind::Decode(e.to_string())))
}
