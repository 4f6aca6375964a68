//! Request building — prompt text plus inline image parts.
//!
//! A `GenerateRequest` is provider-neutral; gemini.rs turns it into the
//! `generateContent` wire body.

use super::error::LlmError;
use super::prompts;
use super::schema::ResponseSchema;

/// An image attached inline to a request. `data` is base64, no data-URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData(ImagePart),
}

/// How the backend should shape its output.
#[derive(Clone, Copy)]
pub enum GenerationMode {
    /// JSON only, constrained by a declared schema.
    SchemaConstrained(&'static ResponseSchema),
    /// Free text.
    BestEffort,
}

impl std::fmt::Debug for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::SchemaConstrained(schema) => {
                write!(f, "SchemaConstrained({})", schema.name)
            }
            GenerationMode::BestEffort => write!(f, "BestEffort"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub mode: GenerationMode,
    /// Disable provider content filtering (chat over arbitrary screens).
    pub relaxed_safety: bool,
}

impl GenerateRequest {
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::InlineData(_)))
            .count()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImagePart> {
        self.parts.iter().filter_map(|p| match p {
            Part::InlineData(image) => Some(image),
            Part::Text(_) => None,
        })
    }

    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            Part::Text(t) => Some(t.as_str()),
            Part::InlineData(_) => None,
        })
    }
}

/// Assemble the RECONSTRUCT request: prompt first, then images in capture order.
///
/// The 6-image ceiling is enforced upstream by the capture session, not here.
pub fn build_reconstruct_request(
    model: &str,
    schema: &'static ResponseSchema,
    images: &[ImagePart],
    context: Option<&str>,
) -> Result<GenerateRequest, LlmError> {
    if images.is_empty() {
        return Err(LlmError::NoImages);
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text(prompts::build_reconstruct_prompt(
        images.len(),
        context,
    )));
    parts.extend(images.iter().cloned().map(Part::InlineData));

    Ok(GenerateRequest {
        model: model.to_string(),
        parts,
        mode: GenerationMode::SchemaConstrained(schema),
        relaxed_safety: false,
    })
}

/// Assemble a single-turn CHAT request: the user message, then every image.
pub fn build_chat_request(model: &str, message: &str, images: &[ImagePart]) -> GenerateRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text(message.to_string()));
    parts.extend(images.iter().cloned().map(Part::InlineData));

    GenerateRequest {
        model: model.to_string(),
        parts,
        mode: GenerationMode::BestEffort,
        relaxed_safety: true,
    }
}
