//! End-to-end tests: real listener, real HTTP, mock providers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

mod common;

const BRASIL_API_BODY: &str = r#"{"cep":"01001000","state":"SP","city":"São Paulo","neighborhood":"Sé","street":"Praça da Sé","service":"open-cep"}"#;
const VIA_CEP_BODY: &str = r#"{"cep":"01001-000","logradouro":"Praça da Sé","complemento":"lado ímpar","bairro":"Sé","localidade":"São Paulo","uf":"SP","ibge":"3550308"}"#;

#[tokio::test]
async fn test_first_success_wins_over_fast_failure() {
    let brasil_api =
        common::start_fixed_provider(200, BRASIL_API_BODY, Duration::from_millis(100)).await;
    let via_cep = common::start_fixed_provider(500, "", Duration::ZERO).await;
    let service = common::start_service(common::config_for(&brasil_api, &via_cep, 1000)).await;

    let res = common::client()
        .get(service.url("/cep/01001000"))
        .send()
        .await
        .expect("service unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["sourceProvider"], "brasil_api");
    assert_eq!(json["postalCode"], "01001000");
    assert_eq!(json["city"], "São Paulo");
    assert_eq!(json["street"], "Praça da Sé");

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_via_cep_fields_are_normalized() {
    let brasil_api = common::start_fixed_provider(404, "{}", Duration::ZERO).await;
    let via_cep = common::start_fixed_provider(200, VIA_CEP_BODY, Duration::ZERO).await;
    let service = common::start_service(common::config_for(&brasil_api, &via_cep, 1000)).await;

    let res = common::client()
        .get(service.url("/cep/01001000"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["sourceProvider"], "via_cep");
    assert_eq!(json["postalCode"], "01001-000");
    assert_eq!(json["state"], "SP");
    assert_eq!(json["neighborhood"], "Sé");

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_all_providers_failing_is_not_found() {
    let brasil_api =
        common::start_fixed_provider(404, r#"{"message":"CEP não encontrado"}"#, Duration::ZERO)
            .await;
    let via_cep = common::start_fixed_provider(200, r#"{"erro":true}"#, Duration::ZERO).await;
    let service = common::start_service(common::config_for(&brasil_api, &via_cep, 1000)).await;

    let res = common::client()
        .get(service.url("/cep/99999999"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "not_found");
    let providers = json["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 2);
    let errors: Vec<_> = providers
        .iter()
        .map(|p| (p["provider"].as_str().unwrap(), p["error"].as_str().unwrap()))
        .collect();
    assert!(errors.contains(&("brasil_api", "unexpected status 404")));
    assert!(errors.contains(&("via_cep", "postal code not found")));

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_slow_providers_time_out() {
    let brasil_api =
        common::start_fixed_provider(200, BRASIL_API_BODY, Duration::from_secs(2)).await;
    let via_cep = common::start_fixed_provider(200, VIA_CEP_BODY, Duration::from_secs(2)).await;
    let service = common::start_service(common::config_for(&brasil_api, &via_cep, 300)).await;

    let started = Instant::now();
    let res = common::client()
        .get(service.url("/cep/01001000"))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(res.status(), 503);
    assert!(elapsed < Duration::from_millis(1500), "request took {:?}", elapsed);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "timeout");

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_empty_postal_code_never_queries_providers() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let provider = common::start_mock_provider(move |_| {
        let h = h.clone();
        async move {
            h.fetch_add(1, Ordering::SeqCst);
            (200, BRASIL_API_BODY.to_string())
        }
    })
    .await;
    let service = common::start_service(common::config_for(&provider, &provider, 1000)).await;
    let client = common::client();

    for path in ["/cep/", "/cep", "/cep/%20"] {
        let res = client.get(service.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400, "path {}", path);
        assert!(res.text().await.unwrap().is_empty());
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_postal_code_is_sent_as_path_segment() {
    let paths = Arc::new(std::sync::Mutex::new(Vec::new()));
    let p = paths.clone();
    let provider = common::start_mock_provider(move |path| {
        p.lock().unwrap().push(path);
        async move { (404, "{}".to_string()) }
    })
    .await;
    let service = common::start_service(common::config_for(&provider, &provider, 1000)).await;

    let res = common::client()
        .get(service.url("/cep/01001%3F000"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let mut seen = paths.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec!["/api/cep/v1/01001%3F000", "/ws/01001%3F000/json/"]);

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_changes_providers() {
    let brasil_api = common::start_fixed_provider(200, BRASIL_API_BODY, Duration::ZERO).await;
    let via_cep = common::start_fixed_provider(200, VIA_CEP_BODY, Duration::ZERO).await;
    let config = common::config_for(&brasil_api, &via_cep, 1000);
    let service = common::start_service(config.clone()).await;
    let client = common::client();

    let json: Value = client
        .get(service.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["providers"], serde_json::json!(["brasil_api", "via_cep"]));

    let mut updated = config;
    updated.providers.brasil_api.enabled = false;
    updated.lookup.timeout_ms = 750;
    service.config_updates.send(updated).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let json: Value = client
        .get(service.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["providers"], serde_json::json!(["via_cep"]));
    assert_eq!(json["timeout_ms"], 750);

    let json: Value = client
        .get(service.url("/cep/01001000"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["sourceProvider"], "via_cep");

    service.shutdown.trigger();
}
