//! Parameter types for edit operations.
//!
//! These structs describe *what* the user asked for, not *how* the pixels
//! get there. They are the interface between the session (which records
//! slider moves and button presses) and the renderers in
//! [`adjust`](super::adjust) and [`transform`](super::transform).
//!
//! ## Types
//!
//! - [`AdjustmentState`]: brightness/contrast/saturation (−100..100), blur
//!   (0..20 px), hue (0..360°) and a [`Preset`]. Clamped on every write.
//! - [`Preset`]: closed set of named filter recipes appended after the sliders.
//! - [`TransformState`]: rotation (mod 360), horizontal/vertical flip, optional crop.
//!
//! Out-of-range values are clamped, never rejected. Non-finite values fall
//! back to the field default.

use crate::types::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TONE_RANGE: (f32, f32) = (-100.0, 100.0);
pub const BLUR_RANGE: (f32, f32) = (0.0, 20.0);

fn clamp_or_zero(value: f32, (lo, hi): (f32, f32)) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        0.0
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Named filter recipe applied after the numeric chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    None,
    Grayscale,
    Sepia,
    Vintage,
    Cool,
    Warm,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::None,
        Preset::Grayscale,
        Preset::Sepia,
        Preset::Vintage,
        Preset::Cool,
        Preset::Warm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::None => "none",
            Preset::Grayscale => "grayscale",
            Preset::Sepia => "sepia",
            Preset::Vintage => "vintage",
            Preset::Cool => "cool",
            Preset::Warm => "warm",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Tone and color parameters for one edit session.
///
/// Fields are private so every write goes through a clamping setter; the
/// struct can never hold an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawAdjustments")]
pub struct AdjustmentState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
    hue: f32,
    preset: Preset,
}

/// Unclamped mirror of [`AdjustmentState`] used only for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAdjustments {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
    hue: f32,
    preset: Preset,
}

impl From<RawAdjustments> for AdjustmentState {
    fn from(raw: RawAdjustments) -> Self {
        let mut state = AdjustmentState::default();
        state
            .set_brightness(raw.brightness)
            .set_contrast(raw.contrast)
            .set_saturation(raw.saturation)
            .set_blur(raw.blur)
            .set_hue(raw.hue)
            .set_preset(raw.preset);
        state
    }
}

impl AdjustmentState {
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn set_brightness(&mut self, value: f32) -> &mut Self {
        self.brightness = clamp_or_zero(value, TONE_RANGE);
        self
    }

    pub fn set_contrast(&mut self, value: f32) -> &mut Self {
        self.contrast = clamp_or_zero(value, TONE_RANGE);
        self
    }

    pub fn set_saturation(&mut self, value: f32) -> &mut Self {
        self.saturation = clamp_or_zero(value, TONE_RANGE);
        self
    }

    pub fn set_blur(&mut self, value: f32) -> &mut Self {
        self.blur = clamp_or_zero(value, BLUR_RANGE);
        self
    }

    /// Hue is an angle: values wrap around instead of saturating at 360.
    pub fn set_hue(&mut self, value: f32) -> &mut Self {
        self.hue = normalize_degrees(value);
        self
    }

    pub fn set_preset(&mut self, preset: Preset) -> &mut Self {
        self.preset = preset;
        self
    }

    /// True when rendering would leave every pixel untouched.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Geometric parameters for one edit session.
///
/// Always interpreted relative to the session's pristine
/// [`ImageAsset`](super::ImageAsset), never to a previously rendered canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawTransform")]
pub struct TransformState {
    rotation: f32,
    flip_h: bool,
    flip_v: bool,
    crop: Option<Rect>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawTransform {
    rotation: f32,
    flip_h: bool,
    flip_v: bool,
    crop: Option<Rect>,
}

impl From<RawTransform> for TransformState {
    fn from(raw: RawTransform) -> Self {
        TransformState {
            rotation: normalize_degrees(raw.rotation),
            flip_h: raw.flip_h,
            flip_v: raw.flip_v,
            crop: raw.crop,
        }
    }
}

impl TransformState {
    /// Rotation in degrees, always in `[0, 360)`.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn flip_h(&self) -> bool {
        self.flip_h
    }

    pub fn flip_v(&self) -> bool {
        self.flip_v
    }

    pub fn crop(&self) -> Option<Rect> {
        self.crop
    }

    pub fn set_rotation(&mut self, degrees: f32) -> &mut Self {
        self.rotation = normalize_degrees(degrees);
        self
    }

    pub fn rotate_by(&mut self, degrees: f32) -> &mut Self {
        self.set_rotation(self.rotation + normalize_degrees(degrees))
    }

    pub fn set_flip_h(&mut self, flip: bool) -> &mut Self {
        self.flip_h = flip;
        self
    }

    pub fn set_flip_v(&mut self, flip: bool) -> &mut Self {
        self.flip_v = flip;
        self
    }

    pub fn toggle_flip_h(&mut self) -> &mut Self {
        self.flip_h = !self.flip_h;
        self
    }

    pub fn toggle_flip_v(&mut self) -> &mut Self {
        self.flip_v = !self.flip_v;
        self
    }

    /// Set the crop, clamped to a `bounds_w × bounds_h` source.
    ///
    /// A crop that is empty after clamping clears the crop instead.
    pub fn set_crop(&mut self, crop: Option<Rect>, bounds_w: u32, bounds_h: u32) -> &mut Self {
        self.crop = crop.and_then(|r| r.clamp_to(bounds_w, bounds_h));
        self
    }

    /// Rotation and flips only; the crop is kept.
    pub fn is_orientation_identity(&self) -> bool {
        self.rotation == 0.0 && !self.flip_h && !self.flip_v
    }

    pub fn is_identity(&self) -> bool {
        self.is_orientation_identity() && self.crop.is_none()
    }
}
