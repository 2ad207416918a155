//! Converts an operator-selected photo into a base64 payload for the backend
//! and a `data:` URL for preview.
//!
//! Each selection change takes a new [`EncodeTicket`]; a completion is applied
//! only if its ticket is still the latest, so a slow read of a superseded file
//! can never overwrite the current selection.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::Completion;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image type (expected PNG or JPEG)")]
    UnsupportedType,
}

/// A successfully encoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub media_type: &'static str,
    /// Raw base64, as sent in `image_base64`.
    pub payload: String,
    /// `data:<media_type>;base64,<payload>`
    pub preview: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeTicket(u64);

/// Holds the encode result for the current selection.
#[derive(Debug, Default)]
pub struct ImageEncoder {
    generation: u64,
    current: Option<EncodedImage>,
}

impl ImageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection: clears both outputs and supersedes any pending encode.
    pub fn begin(&mut self) -> EncodeTicket {
        self.generation += 1;
        self.current = None;
        debug!(generation = self.generation, "Image selection changed");
        EncodeTicket(self.generation)
    }

    /// Applies a finished encode unless the ticket was superseded.
    /// A failed encode leaves both outputs absent.
    pub fn complete(&mut self, ticket: EncodeTicket, result: Result<EncodedImage, EncodeError>) -> Completion {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "Discarding stale image encode"
            );
            return Completion::Discarded;
        }
        match result {
            Ok(encoded) => {
                info!(
                    media_type = encoded.media_type,
                    payload_len = encoded.payload.len(),
                    "Image encoded"
                );
                self.current = Some(encoded);
                Completion::Applied
            }
            Err(e) => {
                warn!(error = %e, "Image could not be encoded; continuing without image");
                Completion::Failed
            }
        }
    }

    pub fn current(&self) -> Option<&EncodedImage> {
        self.current.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.preview.as_str())
    }

    pub fn payload(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.payload.as_str())
    }
}

pub async fn encode_file(path: &Path) -> Result<EncodedImage, EncodeError> {
    let bytes = tokio::fs::read(path).await?;
    encode_bytes(&bytes)
}

/// Accepts PNG and JPEG, detected from content rather than file name.
pub fn encode_bytes(bytes: &[u8]) -> Result<EncodedImage, EncodeError> {
    let media_type = match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => return Err(EncodeError::UnsupportedType),
    };
    let payload = STANDARD.encode(bytes);
    let preview = format!("data:{media_type};base64,{payload}");
    Ok(EncodedImage {
        media_type,
        payload,
        preview,
    })
}
