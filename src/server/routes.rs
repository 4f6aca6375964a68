//! One-step handlers: health, platform, capture, session bookkeeping.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::pipeline::reconstruction_response;
use super::{ApiError, AppState};
use crate::capture::CapturedImage;
use crate::llm;
use crate::session::MAX_IMAGES;

pub(crate) async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "geminiConfigured": state.backend.is_configured(),
    }))
}

pub(crate) async fn handle_platform(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "platform": state.capture.platform() }))
}

pub(crate) async fn handle_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// GET /api/capture — capture now; the image is returned, not stored.
pub(crate) async fn handle_manual_capture(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CapturedImage>, ApiError> {
    let image = state.capture.manual_capture().await?;
    Ok(Json(image))
}

/// POST /api/session/capture — capture now; the session feed appends it.
pub(crate) async fn handle_trigger_capture(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    state.capture.trigger().await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "triggered": true }))).into_response())
}

pub(crate) async fn handle_get_session(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = state.session.lock().await;
    let images: Vec<serde_json::Value> = session
        .images()
        .iter()
        .enumerate()
        .map(|(index, image)| {
            json!({
                "index": index,
                "mimeType": image.mime_type,
                "base64Length": image.data.len(),
            })
        })
        .collect();

    Json(json!({
        "imageCount": session.len(),
        "maxImages": MAX_IMAGES,
        "images": images,
        "transcript": session.transcript(),
        "resultSource": session.last_result().map(|r| r.source),
    }))
}

pub(crate) async fn handle_clear_session(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().await.clear();
    log::info!("[SESSION] Cleared");
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddImageBody {
    /// Data URL or bare base64.
    image: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// POST /api/session/images — append an uploaded image. A full session
/// answers 200 with `accepted: false`.
pub(crate) async fn handle_add_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddImageBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut part = llm::image_from_data_url(&body.image)
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;
    if let Some(mime) = body.mime_type.filter(|m| !m.trim().is_empty()) {
        part.mime_type = mime;
    }

    let mut session = state.session.lock().await;
    let accepted = session.push(CapturedImage::from(part));
    Ok(Json(json!({
        "accepted": accepted,
        "imageCount": session.len(),
    })))
}

pub(crate) async fn handle_remove_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    match state.session.lock().await.remove(index) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(format!("No image at index {}", index))),
    }
}

/// GET /api/session/result — last reconstruction, 404 before the first run.
pub(crate) async fn handle_get_result(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let last = state.session.lock().await.last_result().cloned();
    last.map(reconstruction_response)
        .ok_or_else(|| ApiError::NotFound("No reconstruction yet".to_string()))
}
