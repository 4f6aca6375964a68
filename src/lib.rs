//! Industrial Reconstruct — HTTP service entry point.
//!
//! This is the app shell that wires together all domains. No business
//! logic lives here — only module declarations, environment loading,
//! startup checks, and the runtime.
//!
//! Domains:
//!   - llm      — reconstruction engine (request building, Gemini, parsing, fallback)
//!   - capture  — display capture behind the `CaptureBridge` capability
//!   - session  — bounded image list + transcript + last result
//!   - server   — axum routes over the above

pub mod capture;
pub mod config;
pub mod llm;
pub mod server;
pub mod session;

use config::AppConfig;

/// Load `.env.local` → `.env`, first from the crate root, then from the
/// working directory. The first file found wins.
fn load_env_files() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut roots = vec![manifest_dir.to_path_buf()];
    if let Ok(cwd) = std::env::current_dir() {
        if cwd != manifest_dir {
            roots.push(cwd);
        }
    }

    'env_load: for root in &roots {
        for env_file in [".env.local", ".env"] {
            let path = root.join(env_file);
            if path.exists() {
                match dotenvy::from_path(&path) {
                    Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                    Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
                }
                break 'env_load;
            }
        }
    }
}

/// Entry point — called by the binary.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    load_env_files();
    env_logger::init();

    llm::schema::validate_all()?;
    log::info!("Industrial Reconstruct starting up");

    let config = AppConfig::from_env();
    log::info!(
        "[CONFIG] bind={} reconstruct_model={} chat_model={} analyze_model={}",
        config.bind,
        config.reconstruct_model,
        config.chat_model,
        config.analyze_model
    );
    if !llm::provider::is_in_env() {
        // Keychain is checked lazily on the first request.
        log::warn!(
            "[CONFIG] {} not in environment; requests will fall back to the keychain",
            llm::provider::GEMINI_ENV_KEY
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::start_server(config))
}
