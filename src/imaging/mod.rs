//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with guessed format |
//! | **Color filters** | per-pixel 3×3 color matrix plus offset (CSS filter semantics) |
//! | **Blur** | `image::imageops::blur` |
//! | **Rotate / flip** | `imageops::rotate*` for right angles, bilinear inverse mapping otherwise |
//! | **Cover fit** | centered source crop at the slot aspect + Lanczos3 resize |
//! | **Encode → PNG** | `image::codecs::png::PngEncoder` |
//!
//! The module is split into:
//! - **Parameters**: [`AdjustmentState`] and [`TransformState`], always clamped
//! - **Calculations**: Pure functions for canvas geometry (unit testable)
//! - **Adjust / Transform**: Render a state against a pristine source bitmap
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod adjust;
pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
pub mod transform;

pub use adjust::{FilterChain, FilterStage, apply_filter_chain, render_adjustments};
pub use backend::{AssetStore, BackendError, Dimensions, ImageAsset, ImageBackend};
pub use calculations::{SlotRect, rotated_bounds, slot_pixel_rect};
pub use params::{
    AdjustmentState, BLUR_RANGE, Preset, TONE_RANGE, TransformState, normalize_degrees,
};
pub use rust_backend::{LocalFiles, RustBackend, supported_input_extensions};
pub use transform::{cover_fit, crop_image, render_transform};
