//! Geometric transforms: crop, rotation and flip rendered from a pristine source.
//!
//! The transform is one mapping, not a sequence of passes over a canvas:
//!
//! ```text
//! out = T(outW/2, outH/2) · R(θ) · S(±1, ±1) · T(−srcW/2, −srcH/2) · src
//! ```
//!
//! where `S` carries the flip signs. Right angles are rendered with exact
//! pixel permutations; any other angle is inverse-mapped with bilinear
//! sampling onto a transparent canvas sized by
//! [`rotated_bounds`](super::calculations::rotated_bounds).

use super::calculations::{center_crop_offset, cover_source_dimensions, rotated_bounds};
use super::params::TransformState;
use crate::types::Rect;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage, imageops};

/// Cut `rect` out of `src`. The rect must already be clamped to `src`.
pub fn crop_image(src: &RgbaImage, rect: Rect) -> RgbaImage {
    imageops::crop_imm(src, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Scale `src` to cover `width × height`, trimming the excess evenly
/// (CSS `object-fit: cover`).
///
/// The centered region is cut from the source first, so only that region is
/// resampled.
pub fn cover_fit(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if src.width() == 0 || src.height() == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    let (region_w, region_h) = cover_source_dimensions(src.dimensions(), (width, height));
    let (x, y) = center_crop_offset(src.dimensions(), (region_w, region_h));
    let region = imageops::crop_imm(src, x, y, region_w, region_h);
    if (region_w, region_h) == (width, height) {
        return region.to_image();
    }
    imageops::resize(&*region, width, height, FilterType::Lanczos3)
}

/// Render `state` against `src`.
///
/// Order: crop (source coordinates), then flip, then rotation about the
/// center. The result is always computed from `src`; callers never feed a
/// previous output back in.
pub fn render_transform(src: &RgbaImage, state: &TransformState) -> RgbaImage {
    let cropped;
    let source = match state.crop().and_then(|r| r.clamp_to(src.width(), src.height())) {
        Some(rect) => {
            cropped = crop_image(src, rect);
            &cropped
        }
        None => src,
    };

    if state.is_orientation_identity() {
        return source.clone();
    }

    let rotation = state.rotation();
    if rotation % 90.0 == 0.0 {
        return right_angle(source, rotation as u32, state.flip_h(), state.flip_v());
    }
    rotate_bilinear(source, rotation, state.flip_h(), state.flip_v())
}

/// Exact path for 0/90/180/270 degrees: flip first, then rotate clockwise.
fn right_angle(src: &RgbaImage, degrees: u32, flip_h: bool, flip_v: bool) -> RgbaImage {
    let flipped = match (flip_h, flip_v) {
        (false, false) => None,
        (true, false) => Some(imageops::flip_horizontal(src)),
        (false, true) => Some(imageops::flip_vertical(src)),
        (true, true) => Some(imageops::rotate180(src)),
    };
    let base = flipped.as_ref().unwrap_or(src);

    match degrees {
        90 => imageops::rotate90(base),
        180 => imageops::rotate180(base),
        270 => imageops::rotate270(base),
        _ => base.clone(),
    }
}

/// Arbitrary-angle path: inverse-map every output pixel center into the source.
fn rotate_bilinear(src: &RgbaImage, degrees: f32, flip_h: bool, flip_v: bool) -> RgbaImage {
    let (src_w, src_h) = (src.width(), src.height());
    let (out_w, out_h) = rotated_bounds(src_w, src_h, degrees);
    let mut dst = RgbaImage::new(out_w, out_h);
    if src_w == 0 || src_h == 0 {
        return dst;
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let sx = if flip_h { -1.0 } else { 1.0 };
    let sy = if flip_v { -1.0 } else { 1.0 };
    let (ocx, ocy) = (out_w as f32 * 0.5, out_h as f32 * 0.5);
    let (scx, scy) = (src_w as f32 * 0.5, src_h as f32 * 0.5);

    for (x, y, px) in dst.enumerate_pixels_mut() {
        let u = x as f32 + 0.5 - ocx;
        let v = y as f32 + 0.5 - ocy;
        // R(−θ), then the flip signs (S is its own inverse)
        let rx = cos * u + sin * v;
        let ry = -sin * u + cos * v;
        let src_x = sx * rx + scx - 0.5;
        let src_y = sy * ry + scy - 0.5;
        *px = bilinear_sample(src, src_x, src_y);
    }
    dst
}

/// Bilinear sample at continuous pixel coordinates; outside samples are transparent.
fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let (w, h) = (img.width() as i64, img.height() as i64);

    if x0 < -1 || y0 < -1 || x0 >= w || y0 >= h {
        return Rgba([0, 0, 0, 0]);
    }

    let sample = |sx: i64, sy: i64| -> [f32; 4] {
        if sx < 0 || sy < 0 || sx >= w || sy >= h {
            [0.0; 4]
        } else {
            let p = img.get_pixel(sx as u32, sy as u32);
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
        }
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}
