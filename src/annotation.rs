//! Freehand annotation strokes.
//!
//! Strokes are captured as point lists and replayed on every render; they are
//! never baked into the source bitmap. The layer is append-only until
//! [`AnnotationLayer::clear`], which makes the next render identical to the
//! un-annotated composite.
//!
//! ## Drawing model
//!
//! Each stroke is rasterized into a coverage mask by stamping discs of the
//! stroke's diameter along every segment (round caps and joins for free),
//! then blended source-over onto the canvas once. Blending per stroke rather
//! than per disc keeps translucent colors uniform where stamps overlap.

use crate::types::{Color, Point};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Allowed stroke thickness in pixels.
pub const THICKNESS_RANGE: (f32, f32) = (1.0, 200.0);

fn clamp_thickness(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(THICKNESS_RANGE.0, THICKNESS_RANGE.1)
    } else {
        THICKNESS_RANGE.0
    }
}

/// One freehand stroke. Color and thickness are fixed when the stroke starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStroke")]
pub struct Stroke {
    points: Vec<Point>,
    color: Color,
    thickness: f32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStroke {
    points: Vec<Point>,
    color: Color,
    thickness: f32,
}

impl TryFrom<RawStroke> for Stroke {
    type Error = String;

    fn try_from(raw: RawStroke) -> Result<Self, Self::Error> {
        if raw.points.is_empty() {
            return Err("stroke needs at least one point".to_string());
        }
        Ok(Stroke {
            points: raw.points,
            color: raw.color,
            thickness: clamp_thickness(raw.thickness),
        })
    }
}

impl Stroke {
    pub fn new(start: Point, color: Color, thickness: f32) -> Self {
        Self {
            points: vec![start],
            color,
            thickness: clamp_thickness(thickness),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Draw this stroke onto `canvas`, clipped to its bounds.
    pub fn render_onto(&self, canvas: &mut RgbaImage) {
        let (w, h) = canvas.dimensions();
        if w == 0 || h == 0 || self.color.a == 0 {
            return;
        }
        let radius = self.thickness / 2.0;

        // Bounding box of every stamp, clipped to the canvas
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in &self.points {
            min_x = min_x.min(p.x - radius);
            min_y = min_y.min(p.y - radius);
            max_x = max_x.max(p.x + radius);
            max_y = max_y.max(p.y + radius);
        }
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(w);
        let y1 = (max_y.ceil().max(0.0) as u32).min(h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let mut mask = Mask::new(x0, y0, x1 - x0, y1 - y0);
        let mut prev = self.points[0];
        mask.stamp_disc(prev, radius);
        for &next in &self.points[1..] {
            mask.stamp_segment(prev, next, radius);
            prev = next;
        }

        let color = self.color.to_rgba();
        for (x, y) in mask.covered() {
            let dst = canvas.get_pixel_mut(x, y);
            *dst = blend_over(*dst, color);
        }
    }
}

/// Coverage mask over a clipped window of the canvas.
struct Mask {
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    fn new(x0: u32, y0: u32, width: u32, height: u32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    /// Mark every pixel whose center lies within `radius` of `c`.
    fn stamp_disc(&mut self, c: Point, radius: f32) {
        let r2 = radius * radius;
        let lo_x = ((c.x - radius).floor() as i64).max(self.x0 as i64);
        let hi_x = ((c.x + radius).ceil() as i64).min((self.x0 + self.width) as i64);
        let lo_y = ((c.y - radius).floor() as i64).max(self.y0 as i64);
        let hi_y = ((c.y + radius).ceil() as i64).min((self.y0 + self.height) as i64);
        for y in lo_y..hi_y {
            for x in lo_x..hi_x {
                let dx = x as f32 + 0.5 - c.x;
                let dy = y as f32 + 0.5 - c.y;
                if dx * dx + dy * dy <= r2 {
                    let idx = (y as u32 - self.y0) * self.width + (x as u32 - self.x0);
                    self.bits[idx as usize] = true;
                }
            }
        }
    }

    /// Stamp discs at sub-pixel spacing from `a` to `b`.
    ///
    /// Only the part of the segment that can reach the window is walked, so
    /// far off-canvas points cost no more than on-canvas ones.
    fn stamp_segment(&mut self, a: Point, b: Point, radius: f32) {
        let Some((t0, t1)) = self.clip_segment(a, b, radius) else {
            return;
        };
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
        let visible = (dx * dx + dy * dy).sqrt() * (t1 - t0);
        let steps = (visible * 2.0).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = t0 + (t1 - t0) * step as f64 / steps as f64;
            self.stamp_disc(Point::new((ax + dx * t) as f32, (ay + dy * t) as f32), radius);
        }
    }

    /// Parameter range of `a → b` inside the window grown by `radius`
    /// (Liang-Barsky), or `None` when the segment misses it.
    fn clip_segment(&self, a: Point, b: Point, radius: f32) -> Option<(f64, f64)> {
        let pad = radius as f64 + 1.0;
        let (min_x, max_x) = (self.x0 as f64 - pad, (self.x0 + self.width) as f64 + pad);
        let (min_y, max_y) = (self.y0 as f64 - pad, (self.y0 + self.height) as f64 + pad);
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        let edges = [
            (-dx, ax - min_x),
            (dx, max_x - ax),
            (-dy, ay - min_y),
            (dy, max_y - ay),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        (t0 <= t1).then_some((t0, t1))
    }

    fn covered(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, hit)| **hit)
            .map(|(i, _)| {
                let i = i as u32;
                (self.x0 + i % self.width, self.y0 + i / self.width)
            })
    }
}

/// Porter-Duff source-over on straight alpha.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Ordered committed strokes plus at most one stroke in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationLayer {
    strokes: Vec<Stroke>,
    active: Option<Stroke>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a stroke. An unfinished stroke is committed first.
    pub fn begin_stroke(&mut self, point: Point, color: Color, thickness: f32) {
        self.end_stroke();
        self.active = Some(Stroke::new(point, color, thickness));
    }

    /// Add a point to the active stroke; ignored when no stroke is active.
    pub fn extend_stroke(&mut self, point: Point) {
        match self.active.as_mut() {
            Some(stroke) => stroke.push(point),
            None => debug!(x = point.x, y = point.y, "extend_stroke without active stroke"),
        }
    }

    /// Commit the active stroke, if any.
    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
        }
    }

    /// Append an already-complete stroke.
    pub fn push_stroke(&mut self, stroke: Stroke) {
        self.end_stroke();
        self.strokes.push(stroke);
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.active.is_none()
    }

    /// Draw committed strokes, then the active stroke, onto `canvas`.
    pub fn render_onto(&self, canvas: &mut RgbaImage) {
        for stroke in self.strokes.iter().chain(self.active.iter()) {
            stroke.render_onto(canvas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    // =========================================================================
    // Layer state machine
    // =========================================================================

    #[test]
    fn begin_extend_end_commits_stroke() {
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(1.0, 1.0), RED, 5.0);
        layer.extend_stroke(Point::new(2.0, 2.0));
        assert!(layer.strokes().is_empty());
        assert_eq!(layer.active_stroke().unwrap().points().len(), 2);

        layer.end_stroke();
        assert_eq!(layer.strokes().len(), 1);
        assert!(layer.active_stroke().is_none());
    }

    #[test]
    fn begin_while_active_ends_previous() {
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(0.0, 0.0), RED, 3.0);
        layer.begin_stroke(Point::new(5.0, 5.0), RED, 3.0);
        assert_eq!(layer.strokes().len(), 1);
        assert!(layer.active_stroke().is_some());
    }

    #[test]
    fn extend_without_active_is_ignored() {
        let mut layer = AnnotationLayer::new();
        layer.extend_stroke(Point::new(3.0, 3.0));
        assert!(layer.is_empty());
    }

    #[test]
    fn end_without_active_is_noop() {
        let mut layer = AnnotationLayer::new();
        layer.end_stroke();
        assert!(layer.is_empty());
    }

    #[test]
    fn thickness_is_clamped() {
        assert_eq!(Stroke::new(Point::default(), RED, 0.0).thickness(), 1.0);
        assert_eq!(Stroke::new(Point::default(), RED, 999.0).thickness(), 200.0);
        assert_eq!(Stroke::new(Point::default(), RED, f32::NAN).thickness(), 1.0);
    }

    #[test]
    fn clear_empties_committed_and_active() {
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(0.0, 0.0), RED, 3.0);
        layer.end_stroke();
        layer.begin_stroke(Point::new(1.0, 1.0), RED, 3.0);
        layer.clear();
        assert!(layer.is_empty());
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn single_point_draws_dot() {
        let mut canvas = white(20, 20);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(10.0, 10.0), RED, 4.0);
        layer.render_onto(&mut canvas);
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn segment_covers_its_path_with_round_caps() {
        let mut canvas = white(60, 60);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(10.0, 10.0), RED, 5.0);
        layer.extend_stroke(Point::new(50.0, 50.0));
        layer.end_stroke();
        layer.render_onto(&mut canvas);

        for t in [10u32, 20, 30, 40, 49] {
            assert_eq!(canvas.get_pixel(t, t), &Rgba([255, 0, 0, 255]), "at {t}");
        }
        // Off the path stays untouched
        assert_eq!(canvas.get_pixel(50, 10), &Rgba([255, 255, 255, 255]));
        // Round cap extends behind the start point
        assert_eq!(canvas.get_pixel(8, 9), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn stroke_is_clipped_to_canvas() {
        let mut canvas = white(10, 10);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(-20.0, 5.0), RED, 3.0);
        layer.extend_stroke(Point::new(30.0, 5.0));
        layer.render_onto(&mut canvas);
        assert_eq!(canvas.get_pixel(0, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(9, 5), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn far_off_canvas_point_only_walks_visible_part() {
        let mut canvas = white(10, 10);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(5.0, 5.0), RED, 5.0);
        layer.extend_stroke(Point::new(1e9, 5.0));
        layer.extend_stroke(Point::new(1e9, -1e9));
        layer.end_stroke();

        let started = std::time::Instant::now();
        layer.render_onto(&mut canvas);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(canvas.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(9, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(2, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn stroke_fully_outside_draws_nothing() {
        let mut canvas = white(10, 10);
        let before = canvas.clone();
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(-50.0, -50.0), RED, 3.0);
        layer.extend_stroke(Point::new(-40.0, -40.0));
        layer.render_onto(&mut canvas);
        assert_eq!(canvas, before);
    }

    #[test]
    fn translucent_stroke_blends_once_per_pixel() {
        let mut canvas = white(40, 10);
        let mut layer = AnnotationLayer::new();
        let half_black = Color::rgba(0, 0, 0, 128);
        layer.begin_stroke(Point::new(5.0, 5.0), half_black, 6.0);
        for x in 6..35 {
            layer.extend_stroke(Point::new(x as f32, 5.0));
        }
        layer.render_onto(&mut canvas);
        // Many overlapping stamps, still a single blend: 255 * (1 - 128/255) = 127
        assert_eq!(canvas.get_pixel(20, 5), &Rgba([127, 127, 127, 255]));
    }

    #[test]
    fn later_strokes_draw_over_earlier() {
        let mut canvas = white(20, 20);
        let mut layer = AnnotationLayer::new();
        layer.begin_stroke(Point::new(10.0, 10.0), RED, 6.0);
        layer.begin_stroke(Point::new(10.0, 10.0), Color::rgb(0, 0, 255), 6.0);
        layer.render_onto(&mut canvas);
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn blend_over_transparent_keeps_source() {
        assert_eq!(
            blend_over(Rgba([0, 0, 0, 0]), Rgba([200, 100, 50, 128])),
            Rgba([200, 100, 50, 128])
        );
    }

    #[test]
    fn stroke_deserialize_clamps_and_rejects_empty() {
        let s: Stroke = serde_json::from_str(
            r##"{"points":[{"x":1,"y":2}],"color":"#00ff00","thickness":500}"##,
        )
        .unwrap();
        assert_eq!(s.thickness(), 200.0);
        assert_eq!(s.color(), Color::rgb(0, 255, 0));

        assert!(
            serde_json::from_str::<Stroke>(r##"{"points":[],"color":"#000","thickness":2}"##)
                .is_err()
        );
    }
}
