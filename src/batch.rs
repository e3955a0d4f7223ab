//! Apply one edit recipe to many images.
//!
//! Every input gets its own [`EditSession`]; nothing is shared between items,
//! so they run in parallel on the global [rayon](https://docs.rs/rayon) pool
//! (sized by the caller from `[processing] max_processes`). A failing item
//! becomes a [`BatchEvent::Failed`] and the batch carries on.
//!
//! Output files follow the export naming convention with the input's file
//! stem as context: `beach.jpg` → `beach-1717243200000.png`.

use crate::export::encode_canvas;
use crate::imaging::rust_backend::is_supported_path;
use crate::imaging::{BackendError, ImageBackend};
use crate::recipe::EditRecipe;
use crate::session::EditSession;
use crate::types::ImageRef;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Exported {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
    },
    Failed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub exported: usize,
    pub failed: usize,
}

/// Expand files and directories into a sorted list of supported images.
///
/// Directories are walked recursively. Paths that do not exist are an error;
/// files with unsupported extensions are skipped.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut inputs = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path)?;
        if meta.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() && is_supported_path(entry.path()) {
                    inputs.push(entry.into_path());
                }
            }
        } else if is_supported_path(path) {
            inputs.push(path.clone());
        }
    }
    inputs.sort();
    inputs.dedup();
    Ok(inputs)
}

/// Run `recipe` over every input, writing PNGs into `out_dir`.
///
/// `prefix`, when non-empty, is prepended to each file stem in the output
/// name. All outputs of one batch share the timestamp `at`.
pub fn run_batch(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    recipe: &EditRecipe,
    out_dir: &Path,
    prefix: &str,
    at: DateTime<Utc>,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    std::fs::create_dir_all(out_dir)?;
    if let Some(tx) = &events {
        tx.send(BatchEvent::Started {
            total: inputs.len(),
        })
        .ok();
    }

    let results: Vec<bool> = inputs
        .par_iter()
        .enumerate()
        .map_with(events, |tx, (index, source)| {
            let event = match process_one(backend, source, recipe, out_dir, prefix, at) {
                Ok((output, width, height)) => BatchEvent::Exported {
                    index,
                    source: source.clone(),
                    output,
                    width,
                    height,
                },
                Err(e) => {
                    warn!(source = %source.display(), "batch item failed: {e}");
                    BatchEvent::Failed {
                        index,
                        source: source.clone(),
                        error: e.to_string(),
                    }
                }
            };
            let ok = matches!(event, BatchEvent::Exported { .. });
            if let Some(tx) = tx {
                tx.send(event).ok();
            }
            ok
        })
        .collect();

    let exported = results.iter().filter(|ok| **ok).count();
    let summary = BatchSummary {
        exported,
        failed: results.len() - exported,
    };
    info!(exported = summary.exported, failed = summary.failed, "batch finished");
    Ok(summary)
}

fn process_one(
    backend: &impl ImageBackend,
    source: &Path,
    recipe: &EditRecipe,
    out_dir: &Path,
    prefix: &str,
    at: DateTime<Utc>,
) -> Result<(PathBuf, u32, u32), BatchError> {
    let bytes = std::fs::read(source)?;
    let asset = backend.decode(&ImageRef::Bytes(bytes))?;
    let mut session = EditSession::new(asset);
    recipe.apply(&mut session);

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let context = if prefix.is_empty() {
        stem
    } else {
        format!("{prefix}-{stem}")
    };

    let blob = encode_canvas(backend, Some(session.render()), &context, at)?
        .ok_or_else(|| BackendError::Encode("rendered canvas is empty".to_string()))?;
    let output = out_dir.join(&blob.filename);
    std::fs::write(&output, &blob.bytes)?;
    Ok((output, blob.width, blob.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{gradient_image, png_bytes};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        fs::write(path, png_bytes(&gradient_image(w, h))).unwrap();
    }

    // =========================================================================
    // collect_inputs
    // =========================================================================

    #[test]
    fn collect_walks_directories_and_filters() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("nested")).unwrap();
        write_png(&tmp.path().join("b.png"), 2, 2);
        write_png(&tmp.path().join("nested/a.PNG"), 2, 2);
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();

        let inputs = collect_inputs(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(
            inputs,
            vec![tmp.path().join("b.png"), tmp.path().join("nested/a.PNG")]
        );
    }

    #[test]
    fn collect_dedups_overlapping_paths() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("x.png");
        write_png(&file, 2, 2);
        let inputs = collect_inputs(&[tmp.path().to_path_buf(), file.clone()]).unwrap();
        assert_eq!(inputs, vec![file]);
    }

    #[test]
    fn collect_missing_path_is_error() {
        let result = collect_inputs(&[PathBuf::from("/nonexistent/dir")]);
        assert!(matches!(result, Err(BatchError::Io(_))));
    }

    // =========================================================================
    // run_batch
    // =========================================================================

    #[test]
    fn batch_exports_each_input() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        write_png(&a, 30, 20);
        write_png(&b, 10, 10);
        let out = tmp.path().join("out");

        let recipe = EditRecipe::from_toml("[transform]\nrotation = 90").unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let summary = run_batch(
            &RustBackend::new(),
            &[a, b],
            &recipe,
            &out,
            "",
            at(),
            Some(tx),
        )
        .unwrap();

        assert_eq!(summary, BatchSummary { exported: 2, failed: 0 });
        assert!(out.join("a-1717243200000.png").exists());
        assert!(out.join("b-1717243200000.png").exists());

        let events: Vec<BatchEvent> = rx.into_iter().collect();
        assert_eq!(events[0], BatchEvent::Started { total: 2 });
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::Exported { index: 0, width: 20, height: 30, .. }
        )));
    }

    #[test]
    fn batch_failure_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.png");
        let bad = tmp.path().join("bad.png");
        write_png(&good, 4, 4);
        fs::write(&bad, b"not a png").unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let summary = run_batch(
            &RustBackend::new(),
            &[good, bad.clone()],
            &EditRecipe::default(),
            &tmp.path().join("out"),
            "retouched",
            at(),
            Some(tx),
        )
        .unwrap();

        assert_eq!(summary, BatchSummary { exported: 1, failed: 1 });
        assert!(
            tmp.path()
                .join("out/retouched-good-1717243200000.png")
                .exists()
        );
        let failed: Vec<_> = rx
            .into_iter()
            .filter(|e| matches!(e, BatchEvent::Failed { .. }))
            .collect();
        assert!(matches!(&failed[..], [BatchEvent::Failed { source, .. }] if *source == bad));
    }

    #[test]
    fn batch_without_listener() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.png");
        write_png(&a, 3, 3);
        let summary = run_batch(
            &RustBackend::new(),
            &[a],
            &EditRecipe::default(),
            tmp.path(),
            "",
            at(),
            None,
        )
        .unwrap();
        assert_eq!(summary.exported, 1);
    }
}
