//! Pure calculation functions for canvas geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Rect;

/// Float noise tolerated before rounding a computed edge up.
const EDGE_EPSILON: f64 = 1e-6;

/// Size of the bounding box that holds a `w × h` image rotated by `degrees`
/// without clipping.
///
/// `out_w = w·|cos θ| + h·|sin θ|`, `out_h = w·|sin θ| + h·|cos θ|`, rounded
/// up so no rotated content falls outside.
///
/// # Examples
/// ```
/// # use retouch::imaging::rotated_bounds;
/// assert_eq!(rotated_bounds(400, 300, 90.0), (300, 400));
/// assert_eq!(rotated_bounds(400, 300, 180.0), (400, 300));
/// ```
pub fn rotated_bounds(w: u32, h: u32, degrees: f32) -> (u32, u32) {
    let theta = (degrees as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (w as f64, h as f64);

    let edge = |v: f64| (v - EDGE_EPSILON).ceil().max(0.0) as u32;
    (edge(w * cos + h * sin), edge(w * sin + h * cos))
}

/// Largest region of `source` with the aspect ratio of `target` (crop before resize).
///
/// Cutting this region first and scaling it to exactly `target` is CSS
/// `object-fit: cover`, and the intermediate never exceeds the source size
/// however extreme the aspect ratio. Both sides are at least 1 and at most the
/// source side.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn cover_source_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = (src_h as f64 * tgt_aspect).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = (src_w as f64 / tgt_aspect).round() as u32;
        (src_w, h.clamp(1, src_h))
    }
}

/// Offset of a centered `target` window inside a `filled` region.
pub fn center_crop_offset(filled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(target.0) / 2,
        filled.1.saturating_sub(target.1) / 2,
    )
}

/// A slot rectangle in normalized `[0, 1]` canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SlotRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Map a normalized slot onto a `canvas` in pixels, leaving `gap` pixels
/// between neighbouring slots and around the canvas edge.
///
/// Edges are snapped to whole pixels first and the half-gap inset applied
/// afterwards, so adjacent slots never overlap and the gap stays uniform.
pub fn slot_pixel_rect(slot: SlotRect, canvas: (u32, u32), gap: u32) -> Rect {
    let (cw, ch) = (canvas.0 as f32, canvas.1 as f32);
    let snap = |v: f32| v.round() as i64;

    let left = snap(slot.x * cw);
    let top = snap(slot.y * ch);
    let right = snap((slot.x + slot.width) * cw);
    let bottom = snap((slot.y + slot.height) * ch);

    // Outer edges get the full gap, inner edges half of it from each side
    let inset = |outer: bool| if outer { gap as i64 } else { (gap as i64 + 1) / 2 };
    let x0 = left + inset(left == 0);
    let y0 = top + inset(top == 0);
    let x1 = right - inset(right == canvas.0 as i64);
    let y1 = bottom - inset(bottom == canvas.1 as i64);

    Rect::new(
        x0.max(0) as u32,
        y0.max(0) as u32,
        (x1 - x0).max(1) as u32,
        (y1 - y0).max(1) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // rotated_bounds tests
    // =========================================================================

    #[test]
    fn rotation_zero_keeps_size() {
        assert_eq!(rotated_bounds(400, 300, 0.0), (400, 300));
    }

    #[test]
    fn rotation_right_angles_are_exact() {
        assert_eq!(rotated_bounds(400, 300, 90.0), (300, 400));
        assert_eq!(rotated_bounds(400, 300, 180.0), (400, 300));
        assert_eq!(rotated_bounds(400, 300, 270.0), (300, 400));
    }

    #[test]
    fn rotation_45_grows_bounding_box() {
        // 100·cos45 + 100·sin45 = 141.42 → 142
        assert_eq!(rotated_bounds(100, 100, 45.0), (142, 142));
    }

    #[test]
    fn rotation_30_landscape() {
        // w = 200·0.866 + 100·0.5 = 223.2 → 224; h = 200·0.5 + 100·0.866 = 186.6 → 187
        assert_eq!(rotated_bounds(200, 100, 30.0), (224, 187));
    }

    // =========================================================================
    // cover_source_dimensions tests
    // =========================================================================

    #[test]
    fn cover_wider_source_to_portrait_target() {
        // 800x600 → 400x500 (0.8): keep height, width = 600 * 0.8 = 480
        assert_eq!(cover_source_dimensions((800, 600), (400, 500)), (480, 600));
    }

    #[test]
    fn cover_taller_source_to_landscape_target() {
        // 600x800 → 500x400 (1.25): keep width, height = 600 / 1.25 = 480
        assert_eq!(cover_source_dimensions((600, 800), (500, 400)), (600, 480));
    }

    #[test]
    fn cover_same_aspect_ratio_keeps_whole_source() {
        assert_eq!(cover_source_dimensions((800, 600), (400, 300)), (800, 600));
    }

    #[test]
    fn cover_extreme_strip_stays_within_source() {
        assert_eq!(cover_source_dimensions((20000, 2), (592, 592)), (2, 2));
        assert_eq!(cover_source_dimensions((1, 8000), (300, 100)), (1, 1));
    }

    #[test]
    fn center_crop_offset_centers_excess() {
        assert_eq!(center_crop_offset((667, 500), (400, 500)), (133, 0));
        assert_eq!(center_crop_offset((400, 300), (400, 300)), (0, 0));
    }

    // =========================================================================
    // slot_pixel_rect tests
    // =========================================================================

    #[test]
    fn full_slot_without_gap_covers_canvas() {
        let r = slot_pixel_rect(SlotRect::new(0.0, 0.0, 1.0, 1.0), (300, 200), 0);
        assert_eq!(r, Rect::new(0, 0, 300, 200));
    }

    #[test]
    fn half_slots_share_an_edge_without_overlap() {
        let left = slot_pixel_rect(SlotRect::new(0.0, 0.0, 0.5, 1.0), (200, 100), 10);
        let right = slot_pixel_rect(SlotRect::new(0.5, 0.0, 0.5, 1.0), (200, 100), 10);
        assert_eq!(left, Rect::new(10, 10, 85, 80));
        assert_eq!(right, Rect::new(105, 10, 85, 80));
        assert!(left.x + left.width <= right.x);
    }

    #[test]
    fn thirds_snap_to_whole_pixels() {
        let mid = slot_pixel_rect(SlotRect::new(1.0 / 3.0, 0.0, 1.0 / 3.0, 1.0), (300, 100), 0);
        assert_eq!(mid, Rect::new(100, 0, 100, 100));
    }
}
