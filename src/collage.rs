//! Multi-image collage layouts.
//!
//! A [`CollagePattern`] is a fixed set of slots in normalized canvas
//! coordinates. Images fill slots in order; [`CollageComposer::render`]
//! scales each one to cover its slot (center-cropping the overflow) and paints
//! empty slots as placeholders with a "+" marker.
//!
//! ```text
//! grid-2x2        row-3           mixed-5         split-vertical  split-horizontal
//! ┌────┬────┐     ┌───┬───┬───┐   ┌─────┬─────┐   ┌────┬────┐     ┌─────────┐
//! │ 0  │ 1  │     │ 0 │ 1 │ 2 │   │  0  │  1  │   │    │    │     │    0    │
//! ├────┼────┤     │   │   │   │   ├───┬─┴─┬───┤   │ 0  │ 1  │     ├─────────┤
//! │ 2  │ 3  │     │   │   │   │   │ 2 │ 3 │ 4 │   │    │    │     │    1    │
//! └────┴────┘     └───┴───┴───┘   └───┴───┴───┘   └────┴────┘     └─────────┘
//! ```

use crate::config::CollageConfig;
use crate::imaging::{BackendError, ImageBackend, SlotRect, cover_fit, slot_pixel_rect};
use crate::types::{Color, ImageRef, Rect};
use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CollageError {
    #[error("Collage is full ({current}/{max} images)")]
    CapacityExceeded { current: usize, max: usize },
    #[error("No image at position {index} (collage has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Failed to decode collage image {index}: {source}")]
    Decode { index: usize, source: BackendError },
}

const THIRD: f32 = 1.0 / 3.0;

const GRID_2X2: [SlotRect; 4] = [
    SlotRect::new(0.0, 0.0, 0.5, 0.5),
    SlotRect::new(0.5, 0.0, 0.5, 0.5),
    SlotRect::new(0.0, 0.5, 0.5, 0.5),
    SlotRect::new(0.5, 0.5, 0.5, 0.5),
];
const ROW_3: [SlotRect; 3] = [
    SlotRect::new(0.0, 0.0, THIRD, 1.0),
    SlotRect::new(THIRD, 0.0, THIRD, 1.0),
    SlotRect::new(2.0 * THIRD, 0.0, THIRD, 1.0),
];
const MIXED_5: [SlotRect; 5] = [
    SlotRect::new(0.0, 0.0, 0.5, 0.5),
    SlotRect::new(0.5, 0.0, 0.5, 0.5),
    SlotRect::new(0.0, 0.5, THIRD, 0.5),
    SlotRect::new(THIRD, 0.5, THIRD, 0.5),
    SlotRect::new(2.0 * THIRD, 0.5, THIRD, 0.5),
];
const SPLIT_VERTICAL: [SlotRect; 2] = [
    SlotRect::new(0.0, 0.0, 0.5, 1.0),
    SlotRect::new(0.5, 0.0, 0.5, 1.0),
];
const SPLIT_HORIZONTAL: [SlotRect; 2] = [
    SlotRect::new(0.0, 0.0, 1.0, 0.5),
    SlotRect::new(0.0, 0.5, 1.0, 0.5),
];

/// Collage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollagePattern {
    #[default]
    #[serde(rename = "grid-2x2")]
    Grid2x2,
    #[serde(rename = "row-3")]
    Row3,
    #[serde(rename = "mixed-5")]
    Mixed5,
    SplitVertical,
    SplitHorizontal,
}

impl CollagePattern {
    pub const ALL: [CollagePattern; 5] = [
        CollagePattern::Grid2x2,
        CollagePattern::Row3,
        CollagePattern::Mixed5,
        CollagePattern::SplitVertical,
        CollagePattern::SplitHorizontal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollagePattern::Grid2x2 => "grid-2x2",
            CollagePattern::Row3 => "row-3",
            CollagePattern::Mixed5 => "mixed-5",
            CollagePattern::SplitVertical => "split-vertical",
            CollagePattern::SplitHorizontal => "split-horizontal",
        }
    }

    /// Slots in normalized `[0, 1]` canvas coordinates, in fill order.
    pub fn slot_geometry(self) -> &'static [SlotRect] {
        match self {
            CollagePattern::Grid2x2 => &GRID_2X2,
            CollagePattern::Row3 => &ROW_3,
            CollagePattern::Mixed5 => &MIXED_5,
            CollagePattern::SplitVertical => &SPLIT_VERTICAL,
            CollagePattern::SplitHorizontal => &SPLIT_HORIZONTAL,
        }
    }

    pub fn slot_count(self) -> usize {
        self.slot_geometry().len()
    }
}

impl fmt::Display for CollagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollagePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollagePattern::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = CollagePattern::ALL.iter().map(|p| p.name()).collect();
                format!("unknown pattern '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// A pattern plus the images assigned to its slots, index for index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollageComposition {
    pattern: CollagePattern,
    images: Vec<ImageRef>,
}

impl CollageComposition {
    pub fn new(pattern: CollagePattern) -> Self {
        Self {
            pattern,
            images: Vec::new(),
        }
    }

    pub fn pattern(&self) -> CollagePattern {
        self.pattern
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.pattern.slot_count()
    }
}

/// Builds a [`CollageComposition`] and renders it.
#[derive(Debug, Clone)]
pub struct CollageComposer {
    settings: CollageConfig,
    composition: CollageComposition,
}

impl CollageComposer {
    pub fn new(settings: CollageConfig) -> Self {
        Self {
            settings,
            composition: CollageComposition::default(),
        }
    }

    pub fn settings(&self) -> &CollageConfig {
        &self.settings
    }

    pub fn composition(&self) -> &CollageComposition {
        &self.composition
    }

    /// Switch layout. Always clears the current images.
    pub fn select_pattern(&mut self, pattern: CollagePattern) {
        debug!(%pattern, dropped = self.composition.len(), "selected collage pattern");
        self.composition = CollageComposition::new(pattern);
    }

    /// Append an image to the next free slot, returning its index.
    pub fn add_image(&mut self, image: ImageRef) -> Result<usize, CollageError> {
        let max = self.composition.pattern.slot_count();
        let current = self.composition.len();
        if current >= max {
            return Err(CollageError::CapacityExceeded { current, max });
        }
        self.composition.images.push(image);
        Ok(current)
    }

    /// Remove the image at `index`; later images move up one slot.
    pub fn remove_image(&mut self, index: usize) -> Result<ImageRef, CollageError> {
        let len = self.composition.len();
        if index >= len {
            return Err(CollageError::IndexOutOfRange { index, len });
        }
        Ok(self.composition.images.remove(index))
    }

    /// Indices of slots without an image.
    pub fn placeholder_slots(&self) -> Vec<usize> {
        (self.composition.len()..self.composition.pattern.slot_count()).collect()
    }

    /// Pixel rectangle of every slot on the configured canvas.
    pub fn slot_rects(&self) -> Vec<Rect> {
        let canvas = (self.settings.width, self.settings.height);
        self.composition
            .pattern
            .slot_geometry()
            .iter()
            .map(|slot| slot_pixel_rect(*slot, canvas, self.settings.gap))
            .collect()
    }

    /// Decode every image and draw the collage.
    pub fn render(&self, backend: &impl ImageBackend) -> Result<RgbaImage, CollageError> {
        let s = &self.settings;
        let mut canvas = RgbaImage::from_pixel(s.width, s.height, s.background.to_rgba());

        for (index, rect) in self.slot_rects().into_iter().enumerate() {
            match self.composition.images.get(index) {
                Some(source) => {
                    let asset = backend.decode(source).map_err(|source| {
                        warn!(index, "collage image failed to decode: {source}");
                        CollageError::Decode { index, source }
                    })?;
                    let fitted = cover_fit(asset.pixels(), rect.width, rect.height);
                    imageops::overlay(&mut canvas, &fitted, rect.x as i64, rect.y as i64);
                }
                None => draw_placeholder(&mut canvas, rect, s.placeholder),
            }
        }
        Ok(canvas)
    }
}

/// Fill `rect` with `color` and draw a centered "+" in a darker shade.
fn draw_placeholder(canvas: &mut RgbaImage, rect: Rect, color: Color) {
    fill_rect(canvas, rect, color.to_rgba());

    let short = rect.width.min(rect.height);
    let arm = short / 6;
    let bar = (short / 40).max(2);
    if arm < bar {
        return;
    }
    let marker = Rgba([
        (color.r as u32 * 3 / 5) as u8,
        (color.g as u32 * 3 / 5) as u8,
        (color.b as u32 * 3 / 5) as u8,
        color.a,
    ]);
    let cx = rect.x + rect.width / 2;
    let cy = rect.y + rect.height / 2;
    fill_rect(canvas, Rect::new(cx - arm, cy - bar / 2, arm * 2, bar), marker);
    fill_rect(canvas, Rect::new(cx - bar / 2, cy - arm, bar, arm * 2), marker);
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let Some(rect) = rect.clamp_to(canvas.width(), canvas.height()) else {
        return;
    };
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            canvas.put_pixel(x, y, color);
        }
    }
}
