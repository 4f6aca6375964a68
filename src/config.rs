//! Runtime configuration from environment variables.
//!
//! `.env.local` / `.env` are loaded into the environment by `run()` before
//! `AppConfig::from_env` reads anything.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::capture::default_debug_dir;
use crate::llm::gemini::DEFAULT_API_BASE;
use crate::llm::prompts::DEFAULT_MODEL;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// 25 MB: six full-HD PNG captures plus form overhead.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub api_base: String,
    pub reconstruct_model: String,
    pub chat_model: String,
    pub analyze_model: String,
    pub max_upload_bytes: usize,
    /// None disables local debug copies of captures.
    pub debug_screenshot_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000))),
            api_base: DEFAULT_API_BASE.to_string(),
            reconstruct_model: DEFAULT_MODEL.to_string(),
            chat_model: DEFAULT_MODEL.to_string(),
            analyze_model: DEFAULT_MODEL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            debug_screenshot_dir: Some(default_debug_dir()),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset, empty, or unparsable
    /// values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bind = match get("RECONSTRUCT_BIND") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|e| {
                log::warn!("[CONFIG] Invalid RECONSTRUCT_BIND '{}': {}", raw, e);
                defaults.bind
            }),
            None => defaults.bind,
        };

        let max_upload_bytes = get("MAX_UPLOAD_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_upload_bytes);

        let save_debug = get("SAVE_DEBUG_SCREENSHOTS")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);

        Self {
            bind,
            api_base: get("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            reconstruct_model: get("RECONSTRUCT_MODEL").unwrap_or(defaults.reconstruct_model),
            chat_model: get("CHAT_MODEL").unwrap_or(defaults.chat_model),
            analyze_model: get("ANALYZE_MODEL").unwrap_or(defaults.analyze_model),
            max_upload_bytes,
            debug_screenshot_dir: if save_debug {
                defaults.debug_screenshot_dir
            } else {
                None
            },
        }
    }
}
