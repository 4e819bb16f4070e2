//! HTTP mapping for `DoraError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use dora_core::error::{ClientCode, DoraError};

/// Handler error wrapper (the orphan rule keeps `IntoResponse` off `DoraError`).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DoraError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::MalformedEvent => StatusCode::BAD_REQUEST,
            ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
