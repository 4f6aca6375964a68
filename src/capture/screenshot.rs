//! Display grab + PNG encoding.
//!
//! The real display source needs the `screen-capture` feature (xcap).
//! Without it the headless source reports `CaptureError::Unsupported`.

use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

use super::CaptureError;

/// Captures wider than this are downscaled before encoding.
pub const MAX_CAPTURE_WIDTH: u32 = 1920;

/// Something that can grab a full frame of the primary display.
pub trait FrameSource: Send + Sync + 'static {
    fn grab(&self) -> Result<RgbaImage, CaptureError>;
}

/// Source for builds without display access.
pub struct HeadlessSource;

impl FrameSource for HeadlessSource {
    fn grab(&self) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}

/// Primary-monitor capture via xcap.
#[cfg(feature = "screen-capture")]
pub struct XcapSource;

#[cfg(feature = "screen-capture")]
impl FrameSource for XcapSource {
    fn grab(&self) -> Result<RgbaImage, CaptureError> {
        let monitors = xcap::Monitor::all().map_err(|e| CaptureError::Grab(e.to_string()))?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| monitors.first())
            .ok_or_else(|| CaptureError::Grab("No screen sources found".to_string()))?;
        monitor
            .capture_image()
            .map_err(|e| CaptureError::Grab(e.to_string()))
    }
}

/// Downscale to `max_width` (keeping aspect ratio) and encode as PNG bytes.
pub fn encode_png(frame: RgbaImage, max_width: u32) -> Result<Vec<u8>, CaptureError> {
    let (width, height) = frame.dimensions();
    let frame = if width > max_width {
        let scaled_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
        image::imageops::resize(&frame, max_width, scaled_height, FilterType::Triangle)
    } else {
        frame
    };

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgba8(frame).write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;
    Ok(png_bytes)
}

/// Where local debug copies of captures go.
pub fn default_debug_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("industrial-reconstruct")
        .join("screenshots")
}

/// Write `screenshot_<epoch_ms>.png` into `dir`. Failures are logged, not returned.
pub(crate) fn save_debug_copy(dir: &Path, png_bytes: &[u8]) -> Option<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        log::warn!("[CAPTURE] Could not create {}: {}", dir.display(), e);
        return None;
    }
    let epoch_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let path = dir.join(format!("screenshot_{}.png", epoch_ms));
    match std::fs::write(&path, png_bytes) {
        Ok(()) => {
            log::info!("[CAPTURE] Screenshot saved to: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::warn!("[CAPTURE] Failed to save debug copy: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_frames_are_downscaled() {
        let frame = RgbaImage::new(400, 100);
        let png = encode_png(frame, 200).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 50));
    }

    #[test]
    fn narrow_frames_keep_their_size() {
        let png = encode_png(RgbaImage::new(64, 48), MAX_CAPTURE_WIDTH).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn headless_source_is_unsupported() {
        assert!(matches!(HeadlessSource.grab(), Err(CaptureError::Unsupported)));
    }

    #[test]
    fn debug_copy_lands_in_dir() {
        let dir = std::env::temp_dir().join("ir-test-debug-copy");
        let _ = std::fs::remove_dir_all(&dir);
        let path = save_debug_copy(&dir, b"png").unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
