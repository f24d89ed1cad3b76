//! API error handling

use crate::error::GatewayError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, kind: "invalid_argument", message: msg.into() }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, kind: "unavailable", message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, kind: "server_error", message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": self.kind,
                "code": self.status.as_str()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::EngineFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, kind: err.kind(), message: err.to_string() }
    }
}

/// Body extraction failures keep the JSON error shape; the status is axum's
/// (400, 415 or 422).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self { status: rejection.status(), kind: "invalid_argument", message: rejection.body_text() }
    }
}
