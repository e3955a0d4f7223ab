//! Live editing state for one image, and the editor that owns it.
//!
//! An [`EditSession`] aggregates the pristine [`ImageAsset`] with the
//! adjustment, transform and annotation states. Every change re-renders from
//! the asset; the adjusted and transformed base is cached so stroke events
//! only recomposite the overlay.
//!
//! The [`Editor`] sits above sessions and handles source selection. Decoding
//! is the only step that may finish out of order (the user can pick another
//! image while the first is still decoding), so each load request gets a
//! [`LoadTicket`] with a fresh generation. Only the newest ticket may commit;
//! older completions resolve to [`LoadOutcome::Stale`] and are dropped.

use crate::annotation::AnnotationLayer;
use crate::imaging::{
    AdjustmentState, BackendError, ImageAsset, ImageBackend, TransformState,
};
use crate::render::{render_base, render_composite};
use crate::types::{Color, ImageRef, Point, Rect};
use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to load image: {0}")]
    Decode(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    asset: ImageAsset,
    adjustments: AdjustmentState,
    transform: TransformState,
    annotations: AnnotationLayer,
    base: Option<RgbaImage>,
    canvas: Option<RgbaImage>,
}

impl EditSession {
    pub fn new(asset: ImageAsset) -> Self {
        Self {
            asset,
            adjustments: AdjustmentState::default(),
            transform: TransformState::default(),
            annotations: AnnotationLayer::default(),
            base: None,
            canvas: None,
        }
    }

    pub fn asset(&self) -> &ImageAsset {
        &self.asset
    }

    pub fn adjustments(&self) -> &AdjustmentState {
        &self.adjustments
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    fn invalidate_base(&mut self) {
        self.base = None;
        self.canvas = None;
    }

    fn invalidate_canvas(&mut self) {
        self.canvas = None;
    }

    // =========================================================================
    // Adjustments and transform
    // =========================================================================

    /// Mutate the adjustment state in place. Setters on the state clamp.
    pub fn edit_adjustments(&mut self, f: impl FnOnce(&mut AdjustmentState)) {
        f(&mut self.adjustments);
        self.invalidate_base();
    }

    pub fn set_adjustments(&mut self, adjustments: AdjustmentState) {
        self.adjustments = adjustments;
        self.invalidate_base();
    }

    /// Mutate rotation and flips. Use [`set_crop`](Self::set_crop) for the crop
    /// so it is clamped against this session's asset.
    pub fn edit_transform(&mut self, f: impl FnOnce(&mut TransformState)) {
        f(&mut self.transform);
        self.invalidate_base();
    }

    /// Replace the transform; its crop is re-clamped to the asset bounds.
    pub fn set_transform(&mut self, transform: TransformState) {
        let crop = transform.crop();
        self.transform = transform;
        self.set_crop(crop);
    }

    /// Set or clear the pending crop, in asset coordinates.
    pub fn set_crop(&mut self, crop: Option<Rect>) {
        let (w, h) = (self.asset.width(), self.asset.height());
        self.transform.set_crop(crop, w, h);
        self.invalidate_base();
    }

    /// Replace the asset with the cropped region and reset the transform.
    ///
    /// Returns `false` (and changes nothing) when no crop is pending.
    /// Annotations are kept; they live in output coordinates.
    pub fn commit_crop(&mut self) -> bool {
        let Some(rect) = self.transform.crop() else {
            return false;
        };
        let Some(cropped) = self.asset.crop(rect) else {
            return false;
        };
        debug!(
            from = ?self.asset.dimensions(),
            to = ?cropped.dimensions(),
            "committed crop"
        );
        self.asset = cropped;
        self.transform = TransformState::default();
        self.invalidate_base();
        true
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    pub fn begin_stroke(&mut self, point: Point, color: Color, thickness: f32) {
        self.annotations.begin_stroke(point, color, thickness);
        self.invalidate_canvas();
    }

    pub fn extend_stroke(&mut self, point: Point) {
        let active = self.annotations.active_stroke().is_some();
        self.annotations.extend_stroke(point);
        if active {
            self.invalidate_canvas();
        }
    }

    pub fn end_stroke(&mut self) {
        self.annotations.end_stroke();
    }

    pub fn clear_annotations(&mut self) {
        if !self.annotations.is_empty() {
            self.annotations.clear();
            self.invalidate_canvas();
        }
    }

    /// Return every sub-state to its default, keeping the asset.
    pub fn reset(&mut self) {
        self.adjustments = AdjustmentState::default();
        self.transform = TransformState::default();
        self.annotations.clear();
        self.invalidate_base();
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// The current composite, recomputed only where state changed.
    pub fn render(&mut self) -> &RgbaImage {
        let base = self.base.get_or_insert_with(|| {
            debug!(
                width = self.asset.width(),
                height = self.asset.height(),
                "rendering base"
            );
            render_base(&self.asset, &self.adjustments, &self.transform)
        });
        self.canvas
            .get_or_insert_with(|| render_composite(base, &self.annotations))
    }

    /// The adjusted and transformed image without annotations.
    pub fn render_base(&mut self) -> &RgbaImage {
        self.base
            .get_or_insert_with(|| render_base(&self.asset, &self.adjustments, &self.transform))
    }

    /// CSS `filter` string for a browser-side preview of the adjustments.
    pub fn filter_css(&self) -> String {
        self.adjustments.filter_chain().to_css()
    }
}

/// Handle for one load request. Only the newest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The decoded asset replaced the current session.
    Applied,
    /// A newer request superseded this one; the result was discarded.
    Stale,
}

/// Owner of the current [`EditSession`] and of load-request ordering.
#[derive(Debug, Default)]
pub struct Editor {
    session: Option<EditSession>,
    latest: u64,
    pending: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.session.as_mut()
    }

    /// True while the newest request has not completed.
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Start a load; any earlier outstanding ticket becomes stale.
    pub fn request_load(&mut self) -> LoadTicket {
        self.latest += 1;
        self.pending = true;
        LoadTicket {
            generation: self.latest,
        }
    }

    /// Deliver a decode result for `ticket`.
    ///
    /// A stale ticket is discarded whether it succeeded or failed. A failure
    /// for the current ticket is returned and leaves the session untouched.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        decoded: Result<ImageAsset, BackendError>,
    ) -> Result<LoadOutcome, SessionError> {
        if ticket.generation != self.latest {
            debug!(
                generation = ticket.generation,
                latest = self.latest,
                "discarding stale decode"
            );
            return Ok(LoadOutcome::Stale);
        }
        self.pending = false;
        let asset = decoded.inspect_err(|e| warn!("decode failed: {e}"))?;
        self.session = Some(EditSession::new(asset));
        Ok(LoadOutcome::Applied)
    }

    /// Request, decode and complete in one synchronous step.
    pub fn load(
        &mut self,
        backend: &impl ImageBackend,
        source: &ImageRef,
    ) -> Result<&mut EditSession, SessionError> {
        let ticket = self.request_load();
        let decoded = backend.decode(source);
        self.complete_load(ticket, decoded)?;
        self.session
            .as_mut()
            .ok_or_else(|| SessionError::Decode(BackendError::Unresolved(source.label())))
    }

    /// Drop the current session.
    pub fn close(&mut self) {
        self.session = None;
    }
}
