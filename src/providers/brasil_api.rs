//! BrasilAPI adapter (`GET {base}/api/cep/v1/{cep}`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::lookup::{AddressResult, LookupOutcome, PostalCode, ProviderId};
use crate::providers::{endpoint, transport, ProviderClient};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrasilApiResponse {
    cep: String,
    state: String,
    city: String,
    neighborhood: String,
    street: String,
}

pub struct BrasilApi {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl BrasilApi {
    pub const ID: ProviderId = ProviderId("brasil_api");
    pub const DEFAULT_BASE_URL: &'static str = "https://brasilapi.com.br";

    pub fn new(client: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    fn url(&self, postal_code: &PostalCode) -> Url {
        endpoint(&self.base_url, ["api", "cep", "v1", postal_code.as_str()])
    }
}

#[async_trait]
impl ProviderClient for BrasilApi {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    async fn lookup(&self, postal_code: &PostalCode) -> LookupOutcome {
        let body: BrasilApiResponse =
            transport::fetch_json(&self.client, Self::ID, self.url(postal_code), self.timeout)
                .await?;

        Ok(AddressResult {
            postal_code: body.cep,
            state: body.state,
            city: body.city,
            neighborhood: body.neighborhood,
            street: body.street,
            source_provider: Self::ID,
        })
    }
}
