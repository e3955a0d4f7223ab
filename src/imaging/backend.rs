//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the engine needs
//! from the outside world: decode and encode. Everything between
//! decode and encode is pure pixel math in the rest of this crate.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked. URL references are resolved through an [`AssetStore`] supplied by
//! the caller; the engine itself never does network or storage I/O.

use crate::types::{ImageRef, Rect};
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {source_label}: {reason}")]
    Decode {
        source_label: String,
        reason: String,
    },
    #[error("No asset store can resolve {0}")]
    Unresolved(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Immutable decoded source bitmap.
///
/// Cloning is cheap (the pixels are shared). An asset is never edited in
/// place: committing a crop produces a new asset via [`ImageAsset::crop`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pixels: Arc<RgbaImage>,
}

impl ImageAsset {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// A new asset holding `rect` of this one, or `None` if the rect is
    /// empty after clamping to the asset bounds.
    pub fn crop(&self, rect: Rect) -> Option<ImageAsset> {
        let rect = rect.clamp_to(self.width(), self.height())?;
        Some(ImageAsset::new(super::transform::crop_image(
            &self.pixels,
            rect,
        )))
    }
}

/// Resolves a URL to encoded image bytes (a cloud gallery, a local cache).
pub trait AssetStore: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, BackendError>;
}

/// Trait for image codec backends.
///
/// Every backend must implement both operations so the session,
/// collage and export code stays backend-agnostic.
pub trait ImageBackend: Sync {
    /// Decode a reference into an RGBA bitmap.
    fn decode(&self, source: &ImageRef) -> Result<ImageAsset, BackendError>;

    /// Encode pixels as lossless PNG.
    fn encode_png(&self, pixels: &RgbaImage) -> Result<Vec<u8>, BackendError>;
}
