//! Serialized edit recipes.
//!
//! A recipe is everything a user did to one image, minus the image: slider
//! values, preset, transform, whether the crop was committed, and the
//! annotation strokes. The same recipe can be replayed against any source,
//! which is what the `batch` command does.
//!
//! ```toml
//! commit_crop = true
//!
//! [adjustments]
//! brightness = 10
//! preset = "warm"
//!
//! [transform]
//! rotation = 90
//! crop = { x = 0, y = 0, width = 800, height = 600 }
//!
//! [[strokes]]
//! color = "#ff0000"
//! thickness = 5
//! points = [{ x = 10, y = 10 }, { x = 50, y = 50 }]
//! ```
//!
//! Out-of-range values are clamped on load, like every other way of setting
//! them.

use crate::annotation::Stroke;
use crate::imaging::{AdjustmentState, TransformState};
use crate::session::EditSession;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported recipe format: {0} (use .toml or .json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditRecipe {
    pub adjustments: AdjustmentState,
    pub transform: TransformState,
    /// Bake the transform's crop into the source before anything else renders.
    pub commit_crop: bool,
    pub strokes: Vec<Stroke>,
}

impl EditRecipe {
    /// Load a recipe, choosing the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Self::from_toml(&fs::read_to_string(path)?),
            "json" => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(RecipeError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, RecipeError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json(s: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Snapshot a session's current edits.
    pub fn capture(session: &EditSession) -> Self {
        Self {
            adjustments: *session.adjustments(),
            transform: *session.transform(),
            commit_crop: false,
            strokes: session.annotations().strokes().to_vec(),
        }
    }

    /// Replay this recipe onto `session`.
    ///
    /// The crop is clamped against the session's source. With `commit_crop`
    /// the crop is baked in first and the recipe's rotation and flips are then
    /// applied to the cropped source, which renders the same as the uncommitted
    /// preview. Strokes go through the normal begin/extend/end sequence.
    pub fn apply(&self, session: &mut EditSession) {
        session.set_adjustments(self.adjustments);
        session.set_transform(self.transform);
        if self.commit_crop && session.commit_crop() {
            let orientation = self.transform;
            session.edit_transform(|t| {
                t.set_rotation(orientation.rotation())
                    .set_flip_h(orientation.flip_h())
                    .set_flip_v(orientation.flip_v());
            });
        }
        for stroke in &self.strokes {
            let mut points = stroke.points().iter();
            let Some(first) = points.next() else {
                continue;
            };
            session.begin_stroke(*first, stroke.color(), stroke.thickness());
            for p in points {
                session.extend_stroke(*p);
            }
            session.end_stroke();
        }
    }
}
