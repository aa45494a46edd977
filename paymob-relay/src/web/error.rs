//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::callback::CallbackError;
use crate::config::ConfigError;
use crate::paymob::PaymobError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request is missing required input.
    #[error("{0}")]
    BadRequest(String),

    /// Callback signature did not verify.
    #[error("Invalid HMAC")]
    InvalidSignature,

    /// The relay itself is misconfigured.
    #[error("{0}")]
    NotConfigured(String),

    /// Paymob call failed.
    #[error("checkout error")]
    Upstream(#[source] PaymobError),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, verified) = match &self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            Self::InvalidSignature => (StatusCode::BAD_REQUEST, Some(false)),
            Self::NotConfigured(msg) => {
                error!(error = %msg, "relay_not_configured");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            Self::Upstream(e) => {
                error!(error = %e, "paymob_upstream_error");
                (StatusCode::BAD_GATEWAY, None)
            }
        };

        let body = ErrorResponse {
            ok: false,
            verified,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CallbackError> for ApiError {
    fn from(err: CallbackError) -> Self {
        Self::NotConfigured(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self::NotConfigured(err.to_string())
    }
}

impl From<PaymobError> for ApiError {
    fn from(err: PaymobError) -> Self {
        Self::Upstream(err)
    }
}
