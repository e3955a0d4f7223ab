//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! The primary line for every entity (an edit, a collage slot, a batch item)
//! is what it *is*: dimensions, pattern, positional index. File paths are
//! secondary context on indented `→` lines.
//!
//! # Output Format
//!
//! ## Edit
//!
//! ```text
//! Source 4032x3024
//!     Filter: brightness(110%) sepia(30%) saturate(140%) brightness(105%)
//!     Transform: rotate 90°, flip horizontal
//!     Annotations: 2 strokes
//! Exported edited-1717243200000.png (3024x4032, 18034112 bytes)
//!     → out/edited-1717243200000.png
//! ```
//!
//! ## Collage
//!
//! ```text
//! grid-2x2 (3/4 images)
//!     001 photos/a.jpg
//!     002 photos/b.jpg
//!     003 photos/c.jpg
//!     004 (empty)
//! ```
//!
//! ## Batch
//!
//! ```text
//! Batch (3 images)
//!     001 beach.jpg (800x600)
//!         → out/beach-1717243200000.png
//!     002 broken.jpg: Failed to decode <1024 bytes>: ...
//! Exported 2 images, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::collage::{CollageComposition, CollagePattern};
use crate::export::ExportBlob;
use crate::imaging::{AdjustmentState, TransformState};
use crate::session::EditSession;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Only the stages that change pixels, or `none`.
fn describe_filter(adjustments: &AdjustmentState) -> String {
    let chain = adjustments.filter_chain();
    let stages: Vec<String> = chain.effective_stages().map(|s| s.to_css()).collect();
    if stages.is_empty() {
        "none".to_string()
    } else {
        stages.join(" ")
    }
}

fn describe_transform(transform: &TransformState) -> String {
    let mut parts = Vec::new();
    if transform.rotation() != 0.0 {
        parts.push(format!("rotate {}°", transform.rotation()));
    }
    if transform.flip_h() {
        parts.push("flip horizontal".to_string());
    }
    if transform.flip_v() {
        parts.push("flip vertical".to_string());
    }
    if let Some(c) = transform.crop() {
        parts.push(format!("crop {},{} {}x{}", c.x, c.y, c.width, c.height));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

fn export_lines(blob: &ExportBlob, path: &Path) -> Vec<String> {
    vec![
        format!(
            "Exported {} ({}x{}, {} bytes)",
            blob.filename,
            blob.width,
            blob.height,
            blob.bytes.len()
        ),
        format!("{}\u{2192} {}", indent(1), path.display()),
    ]
}

// ============================================================================
// Edit
// ============================================================================

/// Describe a session's edits and, when exported, where the result went.
pub fn format_edit_output(session: &EditSession, export: Option<(&ExportBlob, &Path)>) -> Vec<String> {
    let asset = session.asset();
    let strokes = session.annotations().strokes().len();
    let mut lines = vec![
        format!("Source {}x{}", asset.width(), asset.height()),
        format!("{}Filter: {}", indent(1), describe_filter(session.adjustments())),
        format!("{}Transform: {}", indent(1), describe_transform(session.transform())),
    ];
    if strokes > 0 {
        lines.push(format!(
            "{}Annotations: {}",
            indent(1),
            plural(strokes, "stroke", "strokes")
        ));
    }
    match export {
        Some((blob, path)) => lines.extend(export_lines(blob, path)),
        None => lines.push("Nothing to export (empty canvas)".to_string()),
    }
    lines
}

pub fn print_edit_output(session: &EditSession, export: Option<(&ExportBlob, &Path)>) {
    for line in format_edit_output(session, export) {
        println!("{}", line);
    }
}

// ============================================================================
// Collage
// ============================================================================

/// Slot-by-slot listing of a composition, plus the export.
pub fn format_collage_output(
    composition: &CollageComposition,
    export: Option<(&ExportBlob, &Path)>,
) -> Vec<String> {
    let pattern = composition.pattern();
    let mut lines = vec![format!(
        "{} ({}/{} images)",
        pattern,
        composition.len(),
        pattern.slot_count()
    )];
    for slot in 0..pattern.slot_count() {
        let label = composition
            .images()
            .get(slot)
            .map(|r| r.label())
            .unwrap_or_else(|| "(empty)".to_string());
        lines.push(format!("{}{} {}", indent(1), format_index(slot + 1), label));
    }
    if let Some((blob, path)) = export {
        lines.extend(export_lines(blob, path));
    }
    lines
}

pub fn print_collage_output(
    composition: &CollageComposition,
    export: Option<(&ExportBlob, &Path)>,
) {
    for line in format_collage_output(composition, export) {
        println!("{}", line);
    }
}

/// Available patterns with their slot counts.
pub fn format_patterns() -> Vec<String> {
    let width = CollagePattern::ALL
        .iter()
        .map(|p| p.name().len())
        .max()
        .unwrap_or(0);
    CollagePattern::ALL
        .iter()
        .map(|p| format!("{:<width$}  {}", p.name(), plural(p.slot_count(), "slot", "slots")))
        .collect()
}

pub fn print_patterns() {
    for line in format_patterns() {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            vec![format!("Batch ({})", plural(*total, "image", "images"))]
        }
        BatchEvent::Exported {
            index,
            source,
            output,
            width,
            height,
        } => vec![
            format!(
                "{}{} {} ({}x{})",
                indent(1),
                format_index(index + 1),
                file_name(source),
                width,
                height
            ),
            format!("{}\u{2192} {}", indent(2), output.display()),
        ],
        BatchEvent::Failed {
            index,
            source,
            error,
        } => vec![format!(
            "{}{} {}: {}",
            indent(1),
            format_index(index + 1),
            file_name(source),
            error
        )],
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let exported = plural(summary.exported, "image", "images");
    if summary.failed == 0 {
        vec![format!("Exported {exported}")]
    } else {
        vec![format!("Exported {exported}, {} failed", summary.failed)]
    }
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}
