//! ViaCEP adapter (`GET {base}/ws/{cep}/json/`).
//!
//! ViaCEP answers unknown postal codes with `200 {"erro": true}` (older
//! deployments send the string `"true"`), which is mapped to
//! [`ProviderErrorKind::NotFound`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::lookup::{
    AddressResult, LookupOutcome, PostalCode, ProviderError, ProviderErrorKind, ProviderId,
};
use crate::providers::{endpoint, transport, ProviderClient};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepResponse {
    cep: String,
    logradouro: String,
    bairro: String,
    localidade: String,
    uf: String,
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

pub struct ViaCep {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ViaCep {
    pub const ID: ProviderId = ProviderId("via_cep");
    pub const DEFAULT_BASE_URL: &'static str = "http://viacep.com.br";

    pub fn new(client: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    fn url(&self, postal_code: &PostalCode) -> Url {
        endpoint(&self.base_url, ["ws", postal_code.as_str(), "json", ""])
    }
}

#[async_trait]
impl ProviderClient for ViaCep {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    async fn lookup(&self, postal_code: &PostalCode) -> LookupOutcome {
        let body: ViaCepResponse =
            transport::fetch_json(&self.client, Self::ID, self.url(postal_code), self.timeout)
                .await?;

        if body.is_not_found() {
            return Err(ProviderError::new(Self::ID, ProviderErrorKind::NotFound));
        }

        Ok(AddressResult {
            postal_code: body.cep,
            state: body.uf,
            city: body.localidade,
            neighborhood: body.bairro,
            street: body.logradouro,
            source_provider: Self::ID,
        })
    }
}
