//! RECONSTRUCT pipeline — images + context → ReconstructionResult.
//!
//! build request → backend (schema-constrained) → strip fences + parse.
//! Backend and parse failures are replaced by `ReconstructionResult::fallback()`
//! and tagged `ResultSource::Fallback`. Only `NoImages` and `Configuration`
//! escape as errors.

use super::error::LlmError;
use super::parse;
use super::provider::GenerativeBackend;
use super::request::{build_reconstruct_request, ImagePart};
use super::schema::RECONSTRUCTION_SCHEMA;
use super::types::{Reconstruction, ReconstructionResult, ResultSource};

/// Run the reconstruction pipeline over an ordered image list.
///
/// Zero images fails before the credential lookup or any network call.
pub async fn reconstruct(
    backend: &dyn GenerativeBackend,
    model: &str,
    images: &[ImagePart],
    context: Option<&str>,
) -> Result<Reconstruction, LlmError> {
    let start = std::time::Instant::now();
    let request = build_reconstruct_request(model, &RECONSTRUCTION_SCHEMA, images, context)?;
    log::info!(
        "[PIPELINE] Reconstruct: {} image(s), context: {}",
        images.len(),
        context.map(|c| !c.trim().is_empty()).unwrap_or(false)
    );

    let outcome = match backend.generate(&request).await {
        Ok(raw) => parse::parse_json::<ReconstructionResult>(&raw).and_then(require_steps),
        Err(e) => Err(e),
    };

    let reconstruction = match outcome {
        Ok(result) => {
            log::info!(
                "[LLM] Parse result: success — '{}', {} steps",
                result.process_overview.process_name,
                result.steps.len()
            );
            let alignment = result.script_alignment();
            if !alignment.is_aligned() {
                log::warn!(
                    "[LLM] Walkthrough script out of step: missing narration for {:?}, orphan narration for {:?}",
                    alignment.steps_without_narration,
                    alignment.narration_without_step
                );
            }
            Reconstruction {
                result,
                source: ResultSource::Live,
            }
        }
        Err(e) if e.is_recoverable() => {
            match &e {
                LlmError::MalformedResponse { raw, source } => {
                    log::warn!(
                        "[LLM] Failed to parse ReconstructionResult: {} — raw: {}",
                        source,
                        &raw[..floor_char_boundary(raw, 200)]
                    );
                }
                other => log::error!("[LLM] {}", other),
            }
            log::info!("[LLM] Parse result: fallback");
            Reconstruction {
                result: ReconstructionResult::fallback(),
                source: ResultSource::Fallback,
            }
        }
        Err(e) => return Err(e),
    };

    log::info!(
        "[PIPELINE] Reconstruct complete in {}ms (source={})",
        start.elapsed().as_millis(),
        reconstruction.source.as_str()
    );
    Ok(reconstruction)
}

/// A live result must carry at least one step.
fn require_steps(result: ReconstructionResult) -> Result<ReconstructionResult, LlmError> {
    if !result.steps.is_empty() {
        return Ok(result);
    }
    let raw = serde_json::to_string(&result).unwrap_or_default();
    Err(LlmError::MalformedResponse {
        raw,
        source: serde::de::Error::custom("steps must not be empty"),
    })
}

/// Largest char boundary in `s` not above `max`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
