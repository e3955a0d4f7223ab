//! Composite rendering: adjustments, then transform, then annotations.
//!
//! Rendering is split in two so a session can cache the expensive part.
//! [`render_base`] depends only on the pristine asset and the adjustment and
//! transform states; [`render_composite`] overlays strokes on a base and is
//! cheap enough to redo on every pointer event.

use crate::annotation::AnnotationLayer;
use crate::imaging::{AdjustmentState, ImageAsset, TransformState};
use crate::imaging::{render_adjustments, render_transform};
use image::RgbaImage;

/// Adjusted and transformed pixels for `asset`, without annotations.
pub fn render_base(
    asset: &ImageAsset,
    adjustments: &AdjustmentState,
    transform: &TransformState,
) -> RgbaImage {
    let adjusted = render_adjustments(asset.pixels(), adjustments);
    if transform.is_identity() {
        return adjusted;
    }
    render_transform(&adjusted, transform)
}

/// `base` with `layer` drawn over it.
pub fn render_composite(base: &RgbaImage, layer: &AnnotationLayer) -> RgbaImage {
    let mut canvas = base.clone();
    layer.render_onto(&mut canvas);
    canvas
}

/// Full pipeline in one call.
pub fn render(
    asset: &ImageAsset,
    adjustments: &AdjustmentState,
    transform: &TransformState,
    layer: &AnnotationLayer,
) -> RgbaImage {
    let mut canvas = render_base(asset, adjustments, transform);
    layer.render_onto(&mut canvas);
    canvas
}
