//! HTTP JSON API over the reconstruction engine.
//!
//! Handlers are split across:
//!   - routes.rs   — simple one-step handlers (health, session, capture, platform)
//!   - pipeline.rs — model-backed handlers (reconstruct, chat, analyze)
//!   - settings.rs — API key storage
//!
//! Endpoints:
//! - GET    /health
//! - GET    /api/platform
//! - GET    /api/capture                   - capture now, return image (not stored)
//! - POST   /api/reconstruct               - multipart upload → ReconstructionResult
//! - POST   /api/chat                      - multipart upload → { response }
//! - POST   /api/analyze                   - single screenshot → SopData
//! - GET    /api/session
//! - DELETE /api/session
//! - POST   /api/session/images
//! - DELETE /api/session/images/{index}
//! - POST   /api/session/capture           - trigger capture, delivered to session feed
//! - POST   /api/session/reconstruct
//! - GET    /api/session/result
//! - POST   /api/session/chat
//! - POST   /api/settings/api-key

mod error;
mod form;
mod pipeline;
mod routes;
mod settings;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::capture::{self, CaptureBridge};
use crate::config::AppConfig;
use crate::llm::{GeminiBackend, GenerativeBackend, KeySource};
use crate::session::CaptureSession;

/// Header carrying `live` or `fallback` on reconstruction responses.
pub const RESULT_SOURCE_HEADER: &str = "x-result-source";

/// Shared state for every handler. Backend and capture are injected.
pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn GenerativeBackend>,
    pub capture: Arc<dyn CaptureBridge>,
    pub session: Arc<Mutex<CaptureSession>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn GenerativeBackend>,
        capture: Arc<dyn CaptureBridge>,
    ) -> Self {
        Self {
            config,
            backend,
            capture,
            session: Arc::new(Mutex::new(CaptureSession::new())),
        }
    }
}

/// Build the router. Also starts the task that feeds delivered captures
/// into the session, so it must be called inside a tokio runtime.
pub fn router(state: Arc<AppState>) -> Router {
    capture::spawn_session_feed(state.capture.subscribe(), Arc::clone(&state.session));

    // CORS: permissive, the UI is served from a separate origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(RESULT_SOURCE_HEADER)]);

    Router::new()
        .route("/health", get(routes::handle_health))
        .route("/api/platform", get(routes::handle_platform))
        .route("/api/capture", get(routes::handle_manual_capture))
        .route("/api/reconstruct", post(pipeline::handle_reconstruct))
        .route("/api/chat", post(pipeline::handle_chat))
        .route("/api/analyze", post(pipeline::handle_analyze))
        .route(
            "/api/session",
            get(routes::handle_get_session).delete(routes::handle_clear_session),
        )
        .route("/api/session/images", post(routes::handle_add_image))
        .route("/api/session/images/{index}", delete(routes::handle_remove_image))
        .route("/api/session/capture", post(routes::handle_trigger_capture))
        .route(
            "/api/session/reconstruct",
            post(pipeline::handle_session_reconstruct),
        )
        .route("/api/session/result", get(routes::handle_get_result))
        .route("/api/session/chat", post(pipeline::handle_session_chat))
        .route("/api/settings/api-key", post(settings::handle_save_api_key))
        .fallback(routes::handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}

/// Display capture for this build: xcap with `screen-capture`, headless otherwise.
pub fn default_capture_bridge(config: &AppConfig) -> Arc<dyn CaptureBridge> {
    #[cfg(feature = "screen-capture")]
    {
        Arc::new(capture::ScreenCaptureBridge::new(
            capture::XcapSource,
            config.debug_screenshot_dir.clone(),
        ))
    }
    #[cfg(not(feature = "screen-capture"))]
    {
        Arc::new(capture::ScreenCaptureBridge::new(
            capture::HeadlessSource,
            config.debug_screenshot_dir.clone(),
        ))
    }
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn GenerativeBackend> =
        Arc::new(GeminiBackend::new(config.api_base.clone(), KeySource::Environment));
    let capture = default_capture_bridge(&config);
    let bind = config.bind;

    let state = Arc::new(AppState::new(config, backend, capture));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("[SERVER] Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("[SERVER] Shut down");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[SERVER] Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("[SERVER] Received shutdown signal");
}
