//! Response parsing — fence stripping + JSON decode.
//!
//! Shape is trusted once the JSON decodes; there is no field-by-field
//! re-validation against the schema here.

use serde::de::DeserializeOwned;

use super::error::LlmError;

const FENCE: &str = "```";

/// Strip markdown code fences from model output.
///
/// If the text contains a fence, the content of the first fenced block is
/// returned (language tag dropped). Otherwise the text is only trimmed.
/// The output never contains a fence, so applying this twice is a no-op.
pub fn strip_code_fences(text: &str) -> String {
    let Some(open) = text.find(FENCE) else {
        return text.trim().to_string();
    };

    let after_open = &text[open + FENCE.len()..];
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    let inner = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    inner.trim().to_string()
}

/// Strip fences and decode into `T`.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<T>(&cleaned)
        .map_err(|source| LlmError::MalformedResponse { raw: cleaned, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ReconstructionResult;

    #[test]
    fn plain_json_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn json_fence_is_removed() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_is_removed() {
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
    }

    #[test]
    fn prose_around_fenced_block_is_dropped() {
        let raw = "Here is the SOP:\n```json\n{\"ok\": true}\n```\nLet me know!";
        assert_eq!(strip_code_fences(raw), "{\"ok\": true}");
    }

    #[test]
    fn unterminated_fence_keeps_the_rest() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "```json\n{\"a\": 1}\n```",
            "``````",
            "`` ```json\n{}\n``` `",
            "no fences at all",
            "```json",
        ];
        for raw in samples {
            let once = strip_code_fences(raw);
            assert_eq!(strip_code_fences(&once), once, "input: {:?}", raw);
        }
    }

    #[test]
    fn prose_reply_is_malformed() {
        let err = parse_json::<ReconstructionResult>("Sure, here's the JSON: {not valid}")
            .unwrap_err();
        match err {
            LlmError::MalformedResponse { raw, .. } => {
                assert_eq!(raw, "Sure, here's the JSON: {not valid}")
            }
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn fenced_result_parses() {
        let json = serde_json::to_string_pretty(&ReconstructionResult::fallback()).unwrap();
        let raw = format!("```json\n{}\n```", json);
        let parsed: ReconstructionResult = parse_json(&raw).unwrap();
        assert_eq!(parsed, ReconstructionResult::fallback());
    }
}
