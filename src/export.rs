//! Lossless PNG export of a rendered canvas.
//!
//! An [`ExportBlob`] is bytes plus a name; where it goes (disk, upload,
//! clipboard) is the caller's business.

use crate::imaging::{BackendError, ImageBackend};
use crate::naming::export_filename;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use tracing::info;

/// Encoded export ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Encode `canvas` as PNG named for `context` at time `at`.
///
/// A missing or zero-sized canvas is not an error: it returns `Ok(None)`.
pub fn encode_canvas(
    backend: &impl ImageBackend,
    canvas: Option<&RgbaImage>,
    context: &str,
    at: DateTime<Utc>,
) -> Result<Option<ExportBlob>, BackendError> {
    let Some(canvas) = canvas.filter(|c| c.width() > 0 && c.height() > 0) else {
        return Ok(None);
    };
    let bytes = backend.encode_png(canvas)?;
    let filename = export_filename(context, at);
    info!(%filename, width = canvas.width(), height = canvas.height(), bytes = bytes.len(), "exported");
    Ok(Some(ExportBlob {
        bytes,
        filename,
        width: canvas.width(),
        height: canvas.height(),
    }))
}

/// [`encode_canvas`] stamped with the current time.
pub fn export_now(
    backend: &impl ImageBackend,
    canvas: Option<&RgbaImage>,
    context: &str,
) -> Result<Option<ExportBlob>, BackendError> {
    encode_canvas(backend, canvas, context, Utc::now())
}
