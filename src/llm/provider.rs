//! Backend trait and credential resolution.
//!
//! Every pipeline talks to the model through `GenerativeBackend`, so the
//! HTTP layer can inject the real Gemini adapter and tests can inject fakes.

use async_trait::async_trait;

use super::error::LlmError;
use super::request::GenerateRequest;

pub const GEMINI_ENV_KEY: &str = "GEMINI_API_KEY";

const KEYCHAIN_SERVICE: &str = "industrial-reconstruct";
const KEYCHAIN_USER: &str = "gemini";

/// A generative model endpoint.
///
/// One call per `generate`, no retries. Returns the raw response text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a call would find credentials. Checked without side effects.
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError>;
}

/// Where a backend reads its API key from. Resolved on every call.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// `GEMINI_API_KEY`, then the OS keychain.
    Environment,
    Fixed(String),
}

impl KeySource {
    pub fn resolve(&self) -> Result<String, LlmError> {
        match self {
            KeySource::Environment => resolve_api_key(),
            KeySource::Fixed(key) if !key.is_empty() => Ok(key.clone()),
            KeySource::Fixed(_) => Err(LlmError::Configuration(GEMINI_ENV_KEY)),
        }
    }

    /// True when `resolve` would succeed.
    pub fn is_available(&self) -> bool {
        match self {
            KeySource::Environment => is_configured(),
            KeySource::Fixed(key) => !key.is_empty(),
        }
    }
}

/// Read the Gemini API key from env, falling back to the OS keychain.
///
/// A keychain hit is loaded into env so later calls skip the lookup.
pub fn resolve_api_key() -> Result<String, LlmError> {
    if let Ok(key) = std::env::var(GEMINI_ENV_KEY) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    if let Some(key) = keychain_key() {
        std::env::set_var(GEMINI_ENV_KEY, &key);
        log::info!("[SETTINGS] Loaded Gemini key from OS keychain");
        return Ok(key);
    }

    log::warn!("[LLM] No {} set", GEMINI_ENV_KEY);
    Err(LlmError::Configuration(GEMINI_ENV_KEY))
}

fn keychain_key() -> Option<String> {
    keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER)
        .ok()?
        .get_password()
        .ok()
        .filter(|k| !k.is_empty())
}

/// True when `GEMINI_API_KEY` is set in the environment.
pub fn is_in_env() -> bool {
    std::env::var(GEMINI_ENV_KEY)
        .map(|k| !k.is_empty())
        .unwrap_or(false)
}

/// Check env and keychain for an API key, without logging or loading it.
pub fn is_configured() -> bool {
    is_in_env() || keychain_key().is_some()
}

/// Save an API key to the OS keychain and the current process env.
pub fn save_api_key(api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key is empty".to_string());
    }

    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER)
        .map_err(|e| format!("Keyring error: {}", e))?;
    if let Err(e) = entry.set_password(api_key) {
        // Headless hosts often have no secret service; env still works.
        log::warn!("[SETTINGS] Keychain unavailable, key kept in env only: {}", e);
    }

    std::env::set_var(GEMINI_ENV_KEY, api_key);
    log::info!("[SETTINGS] Gemini API key saved");
    Ok(())
}
