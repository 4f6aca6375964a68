//! LLM domain — request building, Gemini adapter, parsing, fallback.
//!
//! Public API for the reconstruction engine.
//! External code should only use the functions exported here.
//!
//! Pipelines:
//!   - reconstruct.rs — multi-image SOP, schema-constrained, fallback on failure
//!   - chat.rs        — single-turn free text, apology on failure
//!   - analyze.rs     — single screenshot, errors propagate
//!
//! Shared:
//!   - request.rs  — provider-neutral GenerateRequest + builders
//!   - schema.rs   — static response schemas
//!   - parse.rs    — fence stripping + JSON decode
//!   - provider.rs — GenerativeBackend trait + credential resolution
//!   - gemini.rs   — Gemini `generateContent` adapter

pub mod analyze;
pub mod chat;
pub mod error;
pub mod gemini;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod reconstruct;
pub mod request;
pub mod schema;
pub mod types;

pub use analyze::{analyze_screenshot, image_from_data_url};
pub use chat::chat;
pub use error::{BackendFailure, LlmError};
pub use gemini::GeminiBackend;
pub use provider::{GenerativeBackend, KeySource};
pub use reconstruct::reconstruct;
pub use request::ImagePart;
pub use types::{ChatMessage, ChatRole, Reconstruction, ReconstructionResult, ResultSource, SopData};
