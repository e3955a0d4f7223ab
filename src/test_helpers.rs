//! Shared test utilities for the retouch test suite.
//!
//! Provides synthetic bitmaps with distinct pixels, so that geometric tests
//! can tell exactly where a source pixel ended up.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = gradient_image(40, 30);
//! let asset = asset(40, 30);
//! let bytes = png_bytes(&src);
//! ```

use crate::imaging::ImageAsset;
use image::{ImageEncoder, Rgba, RgbaImage};

/// Opaque image whose red channel follows x, green follows y and blue mixes both.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
            (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8,
            ((x * 7 + y * 13) % 256) as u8,
            255,
        ])
    })
}

/// A gradient wrapped as an [`ImageAsset`].
pub fn asset(width: u32, height: u32) -> ImageAsset {
    ImageAsset::new(gradient_image(width, height))
}

/// A single-color asset.
pub fn solid_asset(width: u32, height: u32, rgba: [u8; 4]) -> ImageAsset {
    ImageAsset::new(RgbaImage::from_pixel(width, height, Rgba(rgba)))
}

/// Encode `img` as PNG bytes.
pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    out
}
