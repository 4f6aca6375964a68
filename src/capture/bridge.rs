//! Capture bridge — the capability handed to the HTTP layer.
//!
//! Captures are delivered two ways: returned directly from
//! `manual_capture`, or broadcast to subscribers by `trigger`.
//! A subscription ends when it is dropped (or `unsubscribe`d).

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use super::screenshot::{encode_png, save_debug_copy, FrameSource, MAX_CAPTURE_WIDTH};
use super::{CaptureError, CapturedImage};
use crate::session::CaptureSession;

const EVENT_CAPACITY: usize = 16;

#[async_trait]
pub trait CaptureBridge: Send + Sync {
    /// Capture now and hand the image back to the caller only.
    async fn manual_capture(&self) -> Result<CapturedImage, CaptureError>;

    /// Capture now and deliver the image to every subscriber.
    async fn trigger(&self) -> Result<(), CaptureError>;

    fn subscribe(&self) -> CaptureSubscription;

    /// Host platform identity ("macos", "windows", "linux", ...).
    fn platform(&self) -> &'static str;
}

/// Receiving end of capture events.
pub struct CaptureSubscription {
    rx: broadcast::Receiver<CapturedImage>,
}

impl CaptureSubscription {
    /// Next delivered capture, or `None` once the bridge is gone.
    /// Events missed while lagging are skipped.
    pub async fn next(&mut self) -> Option<CapturedImage> {
        loop {
            match self.rx.recv().await {
                Ok(image) => return Some(image),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[CAPTURE] Subscriber lagged, {} capture(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving captures. Dropping the receiver detaches it from the channel.
    pub fn unsubscribe(self) {
        drop(self.rx);
    }
}

/// `CaptureBridge` over any `FrameSource`.
pub struct ScreenCaptureBridge<S: FrameSource> {
    source: Arc<S>,
    events: broadcast::Sender<CapturedImage>,
    debug_dir: Option<PathBuf>,
}

impl<S: FrameSource> ScreenCaptureBridge<S> {
    /// `debug_dir`: where to keep a local PNG copy of each capture, if anywhere.
    pub fn new(source: S, debug_dir: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source: Arc::new(source),
            events,
            debug_dir,
        }
    }

    async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let start = std::time::Instant::now();
        let source = Arc::clone(&self.source);

        // Grab + resize + PNG encode is CPU-bound; keep it off the runtime threads.
        let png_bytes = tokio::task::spawn_blocking(move || {
            let frame = source.grab()?;
            encode_png(frame, MAX_CAPTURE_WIDTH)
        })
        .await
        .map_err(|e| CaptureError::Task(e.to_string()))??;

        log::info!(
            "[CAPTURE] Screen captured in {}ms ({} bytes)",
            start.elapsed().as_millis(),
            png_bytes.len()
        );

        if let Some(dir) = &self.debug_dir {
            save_debug_copy(dir, &png_bytes);
        }
        Ok(CapturedImage::png_from_bytes(&png_bytes))
    }
}

#[async_trait]
impl<S: FrameSource> CaptureBridge for ScreenCaptureBridge<S> {
    async fn manual_capture(&self) -> Result<CapturedImage, CaptureError> {
        self.capture().await
    }

    async fn trigger(&self) -> Result<(), CaptureError> {
        let image = self.capture().await?;
        let delivered = self.events.send(image).unwrap_or(0);
        log::info!("[CAPTURE] Capture delivered to {} subscriber(s)", delivered);
        Ok(())
    }

    fn subscribe(&self) -> CaptureSubscription {
        CaptureSubscription {
            rx: self.events.subscribe(),
        }
    }

    fn platform(&self) -> &'static str {
        std::env::consts::OS
    }
}

/// Append every delivered capture to `session` until the bridge goes away.
/// Captures arriving at a full session are dropped by the session itself.
pub fn spawn_session_feed(
    mut subscription: CaptureSubscription,
    session: Arc<Mutex<CaptureSession>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(image) = subscription.next().await {
            let mut guard = session.lock().await;
            if guard.push(image) {
                log::info!("[SESSION] Capture appended ({} held)", guard.len());
            }
        }
        log::info!("[SESSION] Capture feed closed");
    })
}
