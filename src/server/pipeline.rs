//! Model-backed handlers: reconstruct, chat, analyze.
//!
//! Each handler gathers its inputs (upload form or session snapshot),
//! calls the matching `llm` pipeline, and shapes the response. The session
//! lock is never held across a backend call.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::form::UploadForm;
use super::{ApiError, AppState, RESULT_SOURCE_HEADER};
use crate::llm::{self, ChatMessage, ImagePart, Reconstruction};

/// ReconstructionResult body, provenance in a header.
pub(crate) fn reconstruction_response(reconstruction: Reconstruction) -> Response {
    let source = reconstruction.source.as_str();
    let mut response = Json(reconstruction.result).into_response();
    response
        .headers_mut()
        .insert(RESULT_SOURCE_HEADER, HeaderValue::from_static(source));
    response
}

fn chat_response(reply: String) -> Response {
    Json(json!({ "response": reply })).into_response()
}

/// POST /api/reconstruct — multipart: `context`, `imageCount`, `file0..`.
pub(crate) async fn handle_reconstruct(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let images = form.images();

    let reconstruction = llm::reconstruct(
        state.backend.as_ref(),
        &state.config.reconstruct_model,
        &images,
        form.text("context"),
    )
    .await?;

    Ok(reconstruction_response(reconstruction))
}

/// POST /api/chat — multipart: `message`, `imageCount`, `file0..`, `history`.
pub(crate) async fn handle_chat(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let message = form
        .text("message")
        .ok_or_else(|| ApiError::BadRequest("No message provided".to_string()))?;

    let reply = llm::chat(
        state.backend.as_ref(),
        &state.config.chat_model,
        message,
        &form.images(),
        &form.history(),
    )
    .await?;

    Ok(chat_response(reply))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeBody {
    /// Data URL or bare base64.
    image: Option<String>,
}

/// POST /api/analyze — `{"image": ...}` → SopData. Failures are not masked.
pub(crate) async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Response, ApiError> {
    let image = body
        .image
        .as_deref()
        .and_then(llm::image_from_data_url)
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;

    let sop = llm::analyze_screenshot(state.backend.as_ref(), &state.config.analyze_model, image)
        .await?;
    Ok(Json(sop).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionReconstructBody {
    #[serde(default)]
    context: Option<String>,
}

/// POST /api/session/reconstruct — run over the held images, keep the result.
pub(crate) async fn handle_session_reconstruct(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Response, ApiError> {
    // Body is optional; `{}` and no body both mean "no context".
    let body: SessionReconstructBody = if raw.iter().all(u8::is_ascii_whitespace) {
        SessionReconstructBody::default()
    } else {
        serde_json::from_slice(&raw)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?
    };
    let (images, generation): (Vec<ImagePart>, u64) = {
        let session = state.session.lock().await;
        (session.parts(), session.generation())
    };

    let reconstruction = llm::reconstruct(
        state.backend.as_ref(),
        &state.config.reconstruct_model,
        &images,
        body.context.as_deref(),
    )
    .await?;

    state
        .session
        .lock()
        .await
        .set_result_if_current(generation, reconstruction.clone());
    Ok(reconstruction_response(reconstruction))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionChatBody {
    message: String,
}

/// POST /api/session/chat — ask about the held images, record the exchange.
pub(crate) async fn handle_session_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionChatBody>,
) -> Result<Response, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("No message provided".to_string()));
    }

    let (images, history, generation): (Vec<ImagePart>, Vec<ChatMessage>, u64) = {
        let session = state.session.lock().await;
        (session.parts(), session.transcript().to_vec(), session.generation())
    };

    let reply = llm::chat(
        state.backend.as_ref(),
        &state.config.chat_model,
        &body.message,
        &images,
        &history,
    )
    .await?;

    let mut session = state.session.lock().await;
    if session.generation() == generation {
        session.record_exchange(&body.message, &reply);
    }
    drop(session);
    Ok(chat_response(reply))
}
