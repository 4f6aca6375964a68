//! Gemini adapter — `generateContent` via Google AI API.
//!
//! Key differences from a chat-completions style API:
//! - API key in URL query param, not header
//! - Schema-constrained mode sends `responseMimeType: "application/json"`
//!   plus a `responseSchema`; fences are still stripped by the parser
//! - Text lives in `candidates[0].content.parts[*].text`
//! - Token usage in `usageMetadata`

use async_trait::async_trait;
use serde_json::{json, Value};

use super::error::{BackendFailure, LlmError};
use super::provider::{GenerativeBackend, KeySource};
use super::request::{GenerateRequest, GenerationMode, Part};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini Flash pricing (as of Feb 2026):
/// Input:  $0.10 per 1M tokens (under 128k context)
/// Output: $0.40 per 1M tokens (under 128k context)
const INPUT_COST_PER_MILLION: f64 = 0.10;
const OUTPUT_COST_PER_MILLION: f64 = 0.40;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct GeminiBackend {
    api_base: String,
    keys: KeySource,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_base: impl Into<String>, keys: KeySource) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            keys,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

/// Build the `generateContent` JSON body for a request.
pub fn build_body(request: &GenerateRequest) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::InlineData(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.data,
                }
            }),
        })
        .collect();

    let mut body = json!({
        "contents": [
            {
                "role": "user",
                "parts": parts,
            }
        ]
    });

    if let GenerationMode::SchemaConstrained(schema) = request.mode {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema.wire(),
        });
    }

    if request.relaxed_safety {
        body["safetySettings"] = Value::Array(
            SAFETY_CATEGORIES
                .iter()
                .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
                .collect(),
        );
    }

    body
}

/// Extract the concatenated text of the first candidate.
///
/// Gemini format: candidates[0].content.parts[*].text
pub fn extract_text(body: &Value) -> Result<String, BackendFailure> {
    if let Some(reason) = body
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(BackendFailure::Blocked(reason.to_string()));
    }

    let candidate = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or(BackendFailure::EmptyResponse)?;

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.get("finishReason").and_then(Value::as_str) {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(BackendFailure::Blocked(reason.to_string()))
            }
            _ => Err(BackendFailure::EmptyResponse),
        };
    }
    Ok(text)
}

fn log_usage(body: &Value) {
    let Some(usage) = body.get("usageMetadata") else {
        return;
    };
    let input_tokens = usage["promptTokenCount"].as_u64().unwrap_or(0);
    let output_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
    if input_tokens > 0 || output_tokens > 0 {
        log::info!("[LLM] Input tokens: {}", input_tokens);
        log::info!("[LLM] Output tokens: {}", output_tokens);
        let cost = (input_tokens as f64 * INPUT_COST_PER_MILLION
            + output_tokens as f64 * OUTPUT_COST_PER_MILLION)
            / 1_000_000.0;
        log::info!("[LLM] Estimated cost: ${:.6}", cost);
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.keys.is_available()
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        let api_key = self.keys.resolve()?;

        log::info!("[LLM] Provider: gemini");
        log::info!(
            "[LLM] Model: {} ({:?}, {} image(s))",
            request.model,
            request.mode,
            request.image_count()
        );

        let start = std::time::Instant::now();
        let url = self.endpoint_for_model(&request.model);

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .header("content-type", "application/json")
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                log::error!("[LLM] HTTP request failed: {}", e);
                BackendFailure::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[LLM] Gemini API returned {}: {}", status, body);
            return Err(BackendFailure::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendFailure::Transport(e.without_url()))?;

        log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());
        log_usage(&body);

        let text = extract_text(&body).map_err(|e| {
            log::warn!("[LLM] {}", e);
            e
        })?;
        log::info!("[LLM] Response: {} chars", text.len());
        Ok(text)
    }
}
