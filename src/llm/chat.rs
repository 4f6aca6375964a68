//! CHAT pipeline — one free-text question over the captured images.
//!
//! Single-turn: prior turns are accepted so callers can pass their
//! transcript, but they are not sent to the model. Backend failures become
//! the literal `CHAT_ERROR_REPLY` instead of an error.

use super::error::LlmError;
use super::prompts::CHAT_ERROR_REPLY;
use super::provider::GenerativeBackend;
use super::request::{build_chat_request, ImagePart};
use super::types::ChatMessage;

/// Ask one question about `images`. Returns the assistant turn text.
///
/// Only `LlmError::Configuration` is returned as an error.
pub async fn chat(
    backend: &dyn GenerativeBackend,
    model: &str,
    message: &str,
    images: &[ImagePart],
    history: &[ChatMessage],
) -> Result<String, LlmError> {
    if !history.is_empty() {
        log::debug!(
            "[CHAT] {} prior turn(s) received; single-turn call, not forwarded",
            history.len()
        );
    }

    let request = build_chat_request(model, message, images);
    log::info!(
        "[CHAT] Message: {} chars, {} image(s)",
        message.len(),
        images.len()
    );

    match backend.generate(&request).await {
        Ok(text) => Ok(text),
        Err(e @ LlmError::Configuration(_)) => Err(e),
        Err(e) => {
            log::error!("[CHAT] Error processing chat request: {}", e);
            Ok(CHAT_ERROR_REPLY.to_string())
        }
    }
}
