//! Export filename convention: `<context>-<timestamp>.png`.
//!
//! The context names where the image came from (`edited`, `collage`, or an
//! input file stem in batch mode) and the timestamp is Unix milliseconds, so
//! names sort chronologically within a context and never collide across
//! exports made more than a millisecond apart.
//!
//! - `"Edited"` at 2024-01-02T03:04:05.678Z → `edited-1704164645678.png`
//! - `"My Trip (2)"` → context `my-trip-2`

use chrono::{DateTime, Utc};

/// Context used when sanitizing leaves nothing behind.
pub const FALLBACK_CONTEXT: &str = "export";

/// Reduce `context` to lowercase `[a-z0-9-]`, collapsing runs of anything
/// else into a single dash and trimming dashes at either end.
pub fn sanitize_context(context: &str) -> String {
    let mut out = String::with_capacity(context.len());
    for c in context.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Filename for an export of `context` taken at `at`.
pub fn export_filename(context: &str, at: DateTime<Utc>) -> String {
    let context = sanitize_context(context);
    let context = if context.is_empty() {
        FALLBACK_CONTEXT
    } else {
        &context
    };
    format!("{}-{}.png", context, at.timestamp_millis())
}
