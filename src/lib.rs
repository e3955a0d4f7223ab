//! # Retouch
//!
//! A raster image-editing and compositing engine: color and tone
//! adjustments, geometric transforms, freehand annotation, multi-image
//! collages, and lossless PNG export.
//!
//! # Architecture: Render From the Original, Every Time
//!
//! An edit is a set of parameters, never a sequence of pixel mutations. Each
//! render starts from the pristine decoded source and runs a fixed pipeline:
//!
//! ```text
//! ImageAsset ──▶ adjust ──▶ transform ──▶ annotate ──▶ canvas ──▶ export (PNG)
//!  (pristine)   (filter     (crop, flip,   (strokes,
//!               chain)       rotate)        drawn last)
//! ```
//!
//! This gives three properties for free:
//!
//! - **No generational loss**: rotating 90° four times, or flipping twice,
//!   returns the exact source pixels.
//! - **Cheap reset**: defaults in, source out. Nothing to undo.
//! - **Determinism**: the same source and parameters always produce the same
//!   bytes, so tests compare images exactly.
//!
//! Collages are the same idea over many sources: each image is decoded,
//! cover-fitted to its slot and composited onto a fresh canvas.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Parameter states, filter chains, transforms, geometry math, and the codec backend |
//! | [`annotation`] | Freehand strokes: capture, replay, round-cap rasterization |
//! | [`render`] | The adjust → transform → annotate pipeline |
//! | [`session`] | `EditSession` (live state + render cache) and `Editor` (load ordering) |
//! | [`collage`] | Layout patterns, composition editing, collage rendering |
//! | [`export`] | PNG encoding into named `ExportBlob`s |
//! | [`naming`] | `<context>-<millis>.png` filename convention |
//! | [`recipe`] | Serialized edits (TOML/JSON) replayable on any source |
//! | [`batch`] | Parallel recipe application over many files |
//! | [`config`] | `retouch.toml` loading, merging and validation |
//! | [`types`] | Shared value types (`ImageRef`, `Rect`, `Point`, `Color`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## CSS Filter Semantics
//!
//! Adjustments are modeled on CSS filter functions (`brightness()`,
//! `contrast()`, `saturate()`, `blur()`, `hue-rotate()`, plus `grayscale()` and
//! `sepia()` for presets). A [`imaging::FilterChain`] renders both to pixels and
//! to a CSS `filter` string, so a browser preview and the exported file agree.
//!
//! ## Clamp, Don't Reject
//!
//! Slider values come from pointer drags and hand-edited recipes. Out-of-range
//! input is clamped at every entry point (setters, deserializers, CLI flags);
//! no error type exists for it. The parameter structs keep their fields
//! private so an unclamped value cannot exist.
//!
//! ## Newest Load Wins
//!
//! Decoding is the only step that can complete out of order. The
//! [`session::Editor`] tags each request with a generation and discards any
//! completion that is not the newest, success or failure.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and PNG encoding use the `image` crate only. No
//! system libraries, no network: URL references are resolved by a
//! caller-supplied [`imaging::AssetStore`].

pub mod annotation;
pub mod batch;
pub mod collage;
pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod recipe;
pub mod render;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
