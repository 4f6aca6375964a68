//! Multipart upload parsing for `/api/reconstruct` and `/api/chat`.
//!
//! Image fields are `file0`..`fileN` (with an optional `imageCount`), or a
//! single legacy `file`. Everything else is read as text.

use std::collections::{BTreeMap, HashMap};

use axum::extract::Multipart;

use super::ApiError;
use crate::capture::CapturedImage;
use crate::llm::{ChatMessage, ImagePart};
use crate::session::MAX_IMAGES;

#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    text: HashMap<String, String>,
    indexed: BTreeMap<usize, CapturedImage>,
    legacy: Option<CapturedImage>,
}

/// `file7` → Some(7); `file`, `files`, `file_a` → None.
fn file_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("file")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl UploadForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read field '{}': {}", name, e)))?;

            if name == "file" {
                form.legacy = Some(CapturedImage::from_bytes(&bytes, content_type.as_deref()));
            } else if let Some(index) = file_index(&name) {
                form.indexed
                    .insert(index, CapturedImage::from_bytes(&bytes, content_type.as_deref()));
            } else {
                form.text
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }

        log::debug!(
            "[SERVER] Form: {} text field(s), {} indexed file(s), legacy file: {}",
            form.text.len(),
            form.indexed.len(),
            form.legacy.is_some()
        );
        Ok(form)
    }

    /// Non-empty text field.
    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Uploaded images in index order.
    ///
    /// With `imageCount`, only `file0..file{count-1}` are read (missing ones
    /// skipped). Without it, every indexed file is taken. When no indexed
    /// file is present, the legacy `file` field is used. At most
    /// `MAX_IMAGES` images are returned.
    pub(crate) fn images(&self) -> Vec<ImagePart> {
        let declared = self
            .text("imageCount")
            .and_then(|v| v.trim().parse::<usize>().ok());

        let mut images: Vec<ImagePart> = match declared {
            Some(count) => (0..count)
                .filter_map(|i| self.indexed.get(&i))
                .map(CapturedImage::to_part)
                .collect(),
            None => self.indexed.values().map(CapturedImage::to_part).collect(),
        };

        if images.is_empty() && self.indexed.is_empty() {
            if let Some(legacy) = &self.legacy {
                images.push(legacy.to_part());
            }
        }

        if images.len() > MAX_IMAGES {
            log::warn!(
                "[SERVER] {} images uploaded, keeping the first {}",
                images.len(),
                MAX_IMAGES
            );
            images.truncate(MAX_IMAGES);
        }
        images
    }

    /// Prior chat turns from the `history` field. Unparsable history is ignored.
    pub(crate) fn history(&self) -> Vec<ChatMessage> {
        match self.text("history") {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                log::warn!("[SERVER] Ignoring unparsable chat history: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }
}
