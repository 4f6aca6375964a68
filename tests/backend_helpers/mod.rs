//! Shared test helpers: a scripted GenerativeBackend and sample inputs.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use industrial_reconstruct_lib::llm::request::GenerateRequest;
use industrial_reconstruct_lib::llm::{BackendFailure, GenerativeBackend, ImagePart, LlmError};

type Reply = Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>;

/// Backend that answers every call with the same scripted reply and
/// records each request it receives.
pub struct FakeBackend {
    reply: Reply,
    configured: bool,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl FakeBackend {
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with(move || Ok(text.clone()))
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self::with(move || {
            Err(LlmError::BackendCall(BackendFailure::Status {
                status,
                body: "upstream unavailable".to_string(),
            }))
        })
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::with(|| Err(LlmError::Configuration("GEMINI_API_KEY")))
        }
    }

    pub fn with(reply: impl Fn() -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            configured: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.reply)()
    }
}

/// Tiny valid PNG bytes (1x1).
pub fn png_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 128, 255, 255]))
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

pub fn sample_images(count: usize) -> Vec<ImagePart> {
    (0..count)
        .map(|i| ImagePart {
            mime_type: "image/png".to_string(),
            data: format!("aW1hZ2V{}", i),
        })
        .collect()
}

/// A well-formed four-step model reply for a batch QC workflow.
pub const BATCH_QC_REPLY: &str = r#"{
  "process_overview": {
    "process_name": "Batch QC Release",
    "role": "QC Analyst",
    "system_type": "LIMS",
    "goal": "Release batch 7731 after inspection",
    "assumptions": ["Analyst is logged in"]
  },
  "steps": [
    {"step": 1, "title": "Open batch", "instruction": "Open the Batch Review screen."},
    {"step": 2, "title": "Check results", "instruction": "Confirm every assay shows PASS."},
    {"step": 3, "title": "Sign", "instruction": "Enter e-signature credentials."},
    {"step": 4, "title": "Release", "instruction": "Click Release Batch."}
  ],
  "checks_and_risks": {
    "checks": ["Batch ID matches traveler"],
    "risks": ["Releasing with a pending OOS"]
  },
  "execution_checklist": ["Open batch", "Check results", "Sign", "Release"],
  "loom_script": [
    {"step": 1, "narration": "We start on the batch review screen.", "focus": "Batch list"},
    {"step": 2, "narration": "Every assay must read PASS.", "focus": "Results grid"},
    {"step": 3, "narration": "The analyst signs electronically.", "focus": "Signature dialog"},
    {"step": 4, "narration": "Finally the batch is released.", "focus": "Release button"}
  ]
}"#;
