//! Route handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::lookup::ProviderId;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub providers: Vec<ProviderId>,
    pub timeout_ms: u64,
}

/// `GET /cep/{cep}`: race the providers for `cep`.
pub async fn lookup_cep(
    State(state): State<AppState>,
    Path(cep): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);

    if cep.trim().is_empty() {
        tracing::debug!(request_id = %request_id, "Rejecting empty postal code");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let coordinator = state.coordinator.load_full();
    match coordinator.resolve(&cep, coordinator.timeout()).await {
        Ok(address) => (StatusCode::OK, Json(address)).into_response(),
        Err(e) => {
            tracing::info!(
                request_id = %request_id,
                postal_code = %cep,
                status = e.status_code().as_u16(),
                "Lookup failed"
            );
            e.into_response()
        }
    }
}

/// `GET /cep` and `GET /cep/`: no postal code given.
pub async fn missing_cep() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// `GET /health`: liveness plus the active race settings.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let coordinator = state.coordinator.load();
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
        providers: coordinator.providers().iter().map(|p| p.id()).collect(),
        timeout_ms: coordinator.timeout().as_millis() as u64,
    })
}
