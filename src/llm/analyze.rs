//! ANALYZE pipeline — one screenshot → SopData.
//!
//! Unlike RECONSTRUCT there is no fallback here: backend and parse errors
//! propagate so the caller can show a processing fault.

use regex::Regex;
use std::sync::OnceLock;

use super::error::LlmError;
use super::parse;
use super::prompts::ANALYZE_PROMPT;
use super::provider::GenerativeBackend;
use super::request::{GenerateRequest, GenerationMode, ImagePart, Part};
use super::schema::SOP_SCHEMA;
use super::types::SopData;

/// MIME type assumed when the screenshot arrives as raw base64.
const DEFAULT_MIME: &str = "image/jpeg";

fn data_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+)?(?:;[\w=.-]+)*;base64,")
            .expect("data URL pattern is valid")
    })
}

/// Split a `data:<mime>;base64,<payload>` URL into an ImagePart.
///
/// Raw base64 (no `data:` prefix) is accepted as-is with a JPEG MIME type.
pub fn image_from_data_url(input: &str) -> Option<ImagePart> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(caps) = data_url_pattern().captures(input) {
        let prefix_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let payload = &input[prefix_len..];
        if payload.is_empty() {
            return None;
        }
        let mime_type = caps
            .name("mime")
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_MIME);
        return Some(ImagePart {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
        });
    }

    if input.starts_with("data:") {
        return None;
    }
    Some(ImagePart {
        mime_type: DEFAULT_MIME.to_string(),
        data: input.to_string(),
    })
}

/// Analyze a single screenshot. Errors are not masked.
pub async fn analyze_screenshot(
    backend: &dyn GenerativeBackend,
    model: &str,
    image: ImagePart,
) -> Result<SopData, LlmError> {
    let start = std::time::Instant::now();
    let request = GenerateRequest {
        model: model.to_string(),
        parts: vec![Part::Text(ANALYZE_PROMPT.to_string()), Part::InlineData(image)],
        mode: GenerationMode::SchemaConstrained(&SOP_SCHEMA),
        relaxed_safety: false,
    };

    let raw = backend.generate(&request).await?;
    let sop: SopData = parse::parse_json(&raw)?;

    log::info!(
        "[ANALYZE] '{}' — {} steps, {} risks in {}ms",
        sop.overview.process_name,
        sop.steps.len(),
        sop.risks.len(),
        start.elapsed().as_millis()
    );
    Ok(sop)
}
