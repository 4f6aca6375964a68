//! Screen capture domain — public API.
//!
//! This module owns image acquisition from the display. The rest of the
//! app only sees `CaptureBridge`, an injected capability offering
//! trigger / subscribe / unsubscribe / platform.

mod bridge;
mod screenshot;

pub use bridge::{spawn_session_feed, CaptureBridge, CaptureSubscription, ScreenCaptureBridge};
pub use screenshot::{default_debug_dir, encode_png, FrameSource, HeadlessSource, MAX_CAPTURE_WIDTH};

#[cfg(feature = "screen-capture")]
pub use screenshot::XcapSource;

use base64::Engine;
use serde::Serialize;
use thiserror::Error;

use crate::llm::ImagePart;

/// One captured or uploaded image. `data` is base64 without a data-URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    pub mime_type: String,
    pub data: String,
}

impl CapturedImage {
    pub fn png_from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Wrap raw bytes, inferring the MIME type from their header when the
    /// caller has none. Unknown formats default to PNG.
    pub fn from_bytes(bytes: &[u8], mime_type: Option<&str>) -> Self {
        let mime_type = match mime_type.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if m != "application/octet-stream" => m.to_string(),
            _ => image::guess_format(bytes)
                .map(|f| f.to_mime_type().to_string())
                .unwrap_or_else(|_| "image/png".to_string()),
        };
        Self {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn to_part(&self) -> ImagePart {
        ImagePart {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

impl From<ImagePart> for CapturedImage {
    fn from(part: ImagePart) -> Self {
        Self {
            mime_type: part.mime_type,
            data: part.data,
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture is not available on this build")]
    Unsupported,
    #[error("screen grab failed: {0}")]
    Grab(String),
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("capture task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn declared_mime_wins() {
        let image = CapturedImage::from_bytes(PNG_HEADER, Some("image/webp"));
        assert_eq!(image.mime_type, "image/webp");
    }

    #[test]
    fn missing_mime_is_sniffed() {
        assert_eq!(CapturedImage::from_bytes(JPEG_HEADER, None).mime_type, "image/jpeg");
        assert_eq!(
            CapturedImage::from_bytes(PNG_HEADER, Some("application/octet-stream")).mime_type,
            "image/png"
        );
    }

    #[test]
    fn unknown_bytes_default_to_png() {
        assert_eq!(CapturedImage::from_bytes(b"????", None).mime_type, "image/png");
    }

    #[test]
    fn base64_has_no_prefix() {
        let image = CapturedImage::png_from_bytes(b"abc");
        assert_eq!(image.data, "YWJj");
        assert_eq!(image.to_part().data, "YWJj");
    }
}
