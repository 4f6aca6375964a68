//! Error taxonomy for the LLM domain.
//!
//! Only `Configuration` and `NoImages` ever reach an HTTP client from the
//! reconstruct and chat paths. The other two are absorbed by fallback.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Credential missing from both env and keychain.
    #[error("{0} is not defined")]
    Configuration(&'static str),

    #[error("No files uploaded")]
    NoImages,

    #[error("backend call failed: {0}")]
    BackendCall(#[from] BackendFailure),

    /// `raw` is the fence-stripped text that failed to parse.
    #[error("failed to parse model response: {source}")]
    MalformedResponse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Underlying cause of a failed backend call.
///
/// Transient and permanent failures are not distinguished.
#[derive(Debug, Error)]
pub enum BackendFailure {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no text")]
    EmptyResponse,

    #[error("response blocked: {0}")]
    Blocked(String),
}

impl LlmError {
    /// True for errors the reconstruct pipeline replaces with the fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LlmError::BackendCall(_) | LlmError::MalformedResponse { .. }
        )
    }
}
