//! HTTP error mapping. Bodies are always `{"error": message}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::capture::CaptureError;
use crate::llm::LlmError;

#[derive(Debug)]
pub enum ApiError {
    Llm(LlmError),
    Capture(CaptureError),
    BadRequest(String),
    NotFound(String),
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Llm(e)
    }
}

impl From<CaptureError> for ApiError {
    fn from(e: CaptureError) -> Self {
        ApiError::Capture(e)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Llm(e @ LlmError::Configuration(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Llm(e @ LlmError::NoImages) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Llm(e) => (StatusCode::BAD_GATEWAY, format!("processing fault: {}", e)),
            ApiError::Capture(e @ CaptureError::Unsupported) => {
                (StatusCode::NOT_IMPLEMENTED, e.to_string())
            }
            ApiError::Capture(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            log::error!("[SERVER] {} — {}", status, message);
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
