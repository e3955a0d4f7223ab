//! Tone and color adjustment: [`AdjustmentState`] → [`FilterChain`] → pixels.
//!
//! The chain mirrors CSS filter functions so the same descriptor can drive a
//! browser preview ([`FilterChain::to_css`]) and the exported raster
//! ([`apply_filter_chain`]):
//!
//! | Slider | Stage | Baseline |
//! |---|---|---|
//! | brightness | `brightness(p%)` | 100% |
//! | contrast | `contrast(p%)` | 100% |
//! | saturation | `saturate(p%)` | 100% |
//! | blur | `blur(r px)` | 0px |
//! | hue | `hue-rotate(d deg)` | 0deg |
//!
//! Stage order is fixed. A preset appends its own stages after the sliders.
//! Color stages operate on straight RGB, leave alpha alone, and clamp after
//! every stage; the buffer is quantized to 8 bits only before a blur and at
//! the end. Identity stages are skipped entirely.

use super::params::{AdjustmentState, Preset};
use image::RgbaImage;

/// One stage of a filter chain.
///
/// Percent-style amounts are stored as factors (`1.0` = 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStage {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Blur(f32),
    HueRotate(f32),
    Grayscale(f32),
    Sepia(f32),
}

impl FilterStage {
    /// True when the stage cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterStage::Brightness(a) | FilterStage::Contrast(a) | FilterStage::Saturate(a) => {
                a == 1.0
            }
            FilterStage::Blur(r) => r <= 0.0,
            FilterStage::HueRotate(d) => d.rem_euclid(360.0) == 0.0,
            FilterStage::Grayscale(a) | FilterStage::Sepia(a) => a <= 0.0,
        }
    }

    /// CSS `filter` function for this stage.
    pub fn to_css(&self) -> String {
        let pct = |a: f32| format!("{}%", round2(a * 100.0));
        match *self {
            FilterStage::Brightness(a) => format!("brightness({})", pct(a)),
            FilterStage::Contrast(a) => format!("contrast({})", pct(a)),
            FilterStage::Saturate(a) => format!("saturate({})", pct(a)),
            FilterStage::Blur(r) => format!("blur({}px)", round2(r)),
            FilterStage::HueRotate(d) => format!("hue-rotate({}deg)", round2(d)),
            FilterStage::Grayscale(a) => format!("grayscale({})", pct(a)),
            FilterStage::Sepia(a) => format!("sepia({})", pct(a)),
        }
    }

    /// The stage as a color matrix, or `None` for spatial stages (blur).
    fn color_matrix(&self) -> Option<ColorMatrix> {
        let m = match *self {
            FilterStage::Brightness(a) => ColorMatrix::scale(a),
            FilterStage::Contrast(a) => {
                let offset = 127.5 * (1.0 - a);
                ColorMatrix {
                    offset: [offset; 3],
                    ..ColorMatrix::scale(a)
                }
            }
            FilterStage::Saturate(s) => ColorMatrix::saturate(s),
            FilterStage::Grayscale(a) => ColorMatrix::grayscale(a.clamp(0.0, 1.0)),
            FilterStage::Sepia(a) => ColorMatrix::sepia(a.clamp(0.0, 1.0)),
            FilterStage::HueRotate(d) => ColorMatrix::hue_rotate(d),
            FilterStage::Blur(_) => return None,
        };
        Some(m)
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Ordered, pure filter descriptor derived from an [`AdjustmentState`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new(stages: Vec<FilterStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Stages that actually touch pixels.
    pub fn effective_stages(&self) -> impl Iterator<Item = &FilterStage> {
        self.stages.iter().filter(|s| !s.is_identity())
    }

    pub fn is_identity(&self) -> bool {
        self.effective_stages().next().is_none()
    }

    /// Render as a CSS `filter` value, e.g.
    /// `brightness(110%) contrast(100%) saturate(100%) blur(0px) hue-rotate(0deg)`.
    pub fn to_css(&self) -> String {
        if self.stages.is_empty() {
            return "none".to_string();
        }
        self.stages
            .iter()
            .map(FilterStage::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Preset {
    /// Stages this preset appends after the numeric chain.
    pub fn stages(self) -> Vec<FilterStage> {
        use FilterStage::*;
        match self {
            Preset::None => Vec::new(),
            Preset::Grayscale => vec![Grayscale(1.0)],
            Preset::Sepia => vec![Sepia(1.0)],
            Preset::Vintage => vec![Sepia(0.5), Contrast(1.2), Brightness(0.9)],
            Preset::Cool => vec![Saturate(0.85), HueRotate(-15.0), Brightness(1.05)],
            Preset::Warm => vec![Sepia(0.3), Saturate(1.4), Brightness(1.05)],
        }
    }
}

impl AdjustmentState {
    /// The slider stages only, in their fixed order.
    pub fn numeric_chain(&self) -> FilterChain {
        FilterChain::new(vec![
            FilterStage::Brightness(1.0 + self.brightness() / 100.0),
            FilterStage::Contrast(1.0 + self.contrast() / 100.0),
            FilterStage::Saturate(1.0 + self.saturation() / 100.0),
            FilterStage::Blur(self.blur()),
            FilterStage::HueRotate(self.hue()),
        ])
    }

    /// The slider stages followed by the active preset's stages.
    pub fn filter_chain(&self) -> FilterChain {
        let mut chain = self.numeric_chain();
        chain.stages.extend(self.preset().stages());
        chain
    }
}

/// 3×3 RGB matrix plus offset, on the 0..255 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorMatrix {
    m: [[f32; 3]; 3],
    offset: [f32; 3],
}

impl ColorMatrix {
    fn scale(a: f32) -> Self {
        Self {
            m: [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            offset: [0.0; 3],
        }
    }

    fn saturate(s: f32) -> Self {
        Self {
            m: [
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ],
            offset: [0.0; 3],
        }
    }

    fn grayscale(amount: f32) -> Self {
        let s = 1.0 - amount;
        Self {
            m: [
                [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
                [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
                [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
            ],
            offset: [0.0; 3],
        }
    }

    fn sepia(amount: f32) -> Self {
        let s = 1.0 - amount;
        Self {
            m: [
                [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
                [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
                [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
            ],
            offset: [0.0; 3],
        }
    }

    fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                ],
                [
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                ],
                [
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ],
            ],
            offset: [0.0; 3],
        }
    }

    #[inline]
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (i, row) in self.m.iter().enumerate() {
            let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset[i];
            out[i] = v.clamp(0.0, 255.0);
        }
        out
    }
}

/// Run a sequence of color matrices over every pixel, quantizing once at the end.
fn apply_color_run(img: &mut RgbaImage, run: &[ColorMatrix]) {
    if run.is_empty() {
        return;
    }
    for px in img.pixels_mut() {
        let mut rgb = [px[0] as f32, px[1] as f32, px[2] as f32];
        for matrix in run {
            rgb = matrix.apply(rgb);
        }
        px[0] = rgb[0].round() as u8;
        px[1] = rgb[1].round() as u8;
        px[2] = rgb[2].round() as u8;
    }
}

/// Apply a filter chain to `src`, returning a new image.
///
/// Pure and deterministic: the same inputs always produce byte-identical
/// output. `src` is never modified.
pub fn apply_filter_chain(src: &RgbaImage, chain: &FilterChain) -> RgbaImage {
    let mut out = src.clone();
    let mut run: Vec<ColorMatrix> = Vec::new();

    for stage in chain.effective_stages() {
        match (stage, stage.color_matrix()) {
            (_, Some(matrix)) => run.push(matrix),
            (FilterStage::Blur(radius), None) => {
                apply_color_run(&mut out, &run);
                run.clear();
                out = image::imageops::blur(&out, *radius);
            }
            (_, None) => {}
        }
    }
    apply_color_run(&mut out, &run);
    out
}

/// Convenience: render `state`'s full chain (sliders plus preset).
pub fn render_adjustments(src: &RgbaImage, state: &AdjustmentState) -> RgbaImage {
    apply_filter_chain(src, &state.filter_chain())
}
