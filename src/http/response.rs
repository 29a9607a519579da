//! Mapping of race outcomes to HTTP responses.
//!
//! # Design Decisions
//! - Missing/empty postal code → 400 with an empty body
//! - All providers failed → 404 Not Found
//! - Deadline elapsed → 503 Service Unavailable
//! - No lookup outcome maps to 500; that stays reserved for real faults

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::lookup::{LookupError, ProviderId};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    providers: Vec<ProviderFailure>,
}

#[derive(Debug, Serialize)]
struct ProviderFailure {
    provider: ProviderId,
    error: String,
}

impl LookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::InvalidPostalCode => StatusCode::BAD_REQUEST,
            LookupError::AllProvidersFailed(_) => StatusCode::NOT_FOUND,
            LookupError::TimedOut { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            LookupError::InvalidPostalCode => return status.into_response(),
            LookupError::AllProvidersFailed(_) => "not_found",
            LookupError::TimedOut { .. } => "timeout",
        };

        let body = ErrorBody {
            error,
            message: self.to_string(),
            providers: self
                .failures()
                .iter()
                .map(|f| ProviderFailure {
                    provider: f.provider,
                    error: f.kind.to_string(),
                })
                .collect(),
        };
        (status, Json(body)).into_response()
    }
}
