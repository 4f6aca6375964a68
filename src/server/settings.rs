//! API key storage endpoint.

use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ApiError;
use crate::llm::provider;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveKeyBody {
    api_key: String,
}

/// POST /api/settings/api-key — keychain + process env.
pub(crate) async fn handle_save_api_key(
    Json(body): Json<SaveKeyBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    provider::save_api_key(body.api_key.trim()).map_err(ApiError::BadRequest)?;
    Ok((StatusCode::OK, Json(json!({ "saved": true }))))
}
