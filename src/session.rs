//! Capture session — the bounded, ordered image list for one operator.
//!
//! Also holds the chat transcript and the last reconstruction so the HTTP
//! layer can serve them back. Nothing here is persisted.

use crate::capture::CapturedImage;
use crate::llm::{ChatMessage, ImagePart, Reconstruction};

/// Captures beyond this are silently dropped.
pub const MAX_IMAGES: usize = 6;

#[derive(Debug, Default)]
pub struct CaptureSession {
    images: Vec<CapturedImage>,
    transcript: Vec<ChatMessage>,
    last_result: Option<Reconstruction>,
    /// Bumped by every `clear`.
    generation: u64,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image. Returns false (session unchanged) when already full.
    pub fn push(&mut self, image: CapturedImage) -> bool {
        if self.images.len() >= MAX_IMAGES {
            log::info!("[SESSION] Max {} images reached — capture dropped", MAX_IMAGES);
            return false;
        }
        self.images.push(image);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<CapturedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    /// Drop images, transcript, and result.
    pub fn clear(&mut self) {
        self.images.clear();
        self.transcript.clear();
        self.last_result = None;
        self.generation += 1;
    }

    /// Changes whenever the session is cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= MAX_IMAGES
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    /// Images in capture order, as request parts.
    pub fn parts(&self) -> Vec<ImagePart> {
        self.images.iter().map(CapturedImage::to_part).collect()
    }

    /// Replace any previous result.
    pub fn set_result(&mut self, reconstruction: Reconstruction) {
        self.last_result = Some(reconstruction);
    }

    /// Store `reconstruction` only if the session has not been cleared since
    /// `generation` was read. Returns whether it was stored.
    pub fn set_result_if_current(&mut self, generation: u64, reconstruction: Reconstruction) -> bool {
        if generation != self.generation {
            log::info!("[SESSION] Session cleared during reconstruction, result discarded");
            return false;
        }
        self.set_result(reconstruction);
        true
    }

    pub fn last_result(&self) -> Option<&Reconstruction> {
        self.last_result.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn record_exchange(&mut self, question: &str, reply: &str) {
        self.transcript.push(ChatMessage::user(question));
        self.transcript.push(ChatMessage::model(reply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ReconstructionResult, ResultSource};

    fn image(tag: &str) -> CapturedImage {
        CapturedImage {
            mime_type: "image/png".to_string(),
            data: tag.to_string(),
        }
    }

    #[test]
    fn seventh_capture_is_discarded() {
        let mut session = CaptureSession::new();
        for i in 0..MAX_IMAGES {
            assert!(session.push(image(&i.to_string())));
        }
        let before: Vec<CapturedImage> = session.images().to_vec();

        assert!(!session.push(image("seventh")));
        assert_eq!(session.len(), MAX_IMAGES);
        assert_eq!(session.images(), before.as_slice());
        assert!(session.is_full());
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut session = CaptureSession::new();
        for tag in ["a", "b", "c"] {
            session.push(image(tag));
        }
        assert_eq!(session.remove(1), Some(image("b")));
        assert_eq!(session.remove(5), None);
        let order: Vec<String> = session.parts().into_iter().map(|p| p.data).collect();
        assert_eq!(order, vec!["a", "c"]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut session = CaptureSession::new();
        session.push(image("a"));
        session.record_exchange("q", "a");
        session.set_result(Reconstruction {
            result: ReconstructionResult::fallback(),
            source: ResultSource::Fallback,
        });

        session.clear();
        assert!(session.is_empty());
        assert!(session.transcript().is_empty());
        assert!(session.last_result().is_none());
    }

    #[test]
    fn result_from_before_a_clear_is_discarded() {
        let mut session = CaptureSession::new();
        session.push(image("a"));
        let generation = session.generation();

        session.clear();
        let stored = session.set_result_if_current(
            generation,
            Reconstruction {
                result: ReconstructionResult::fallback(),
                source: ResultSource::Live,
            },
        );
        assert!(!stored);
        assert!(session.last_result().is_none());

        let generation = session.generation();
        assert!(session.set_result_if_current(
            generation,
            Reconstruction {
                result: ReconstructionResult::fallback(),
                source: ResultSource::Live,
            },
        ));
        assert!(session.last_result().is_some());
    }

    #[test]
    fn new_result_replaces_old() {
        let mut session = CaptureSession::new();
        session.set_result(Reconstruction {
            result: ReconstructionResult::fallback(),
            source: ResultSource::Fallback,
        });
        let mut live = ReconstructionResult::fallback();
        live.process_overview.process_name = "Goods Receipt".to_string();
        session.set_result(Reconstruction {
            result: live,
            source: ResultSource::Live,
        });

        let stored = session.last_result().unwrap();
        assert_eq!(stored.source, ResultSource::Live);
        assert_eq!(stored.result.process_overview.process_name, "Goods Receipt");
    }
}
