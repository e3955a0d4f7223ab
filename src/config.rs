//! Engine configuration module.
//!
//! Handles loading, validating, and merging `retouch.toml` files. Values in a
//! user file are merged over stock defaults, so a file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [annotation]
//! color = "#ff0000"         # Default stroke color
//! thickness = 5.0           # Default stroke thickness (px)
//!
//! [collage]
//! width = 1200              # Output canvas size (px)
//! height = 1200
//! gap = 8                   # Space between slots and around the edge (px)
//! background = "#ffffff"    # Canvas color showing through the gaps
//! placeholder = "#e0e0e0"   # Fill for empty slots
//!
//! [export]
//! edit_context = "edited"       # Filename prefix for single-image exports
//! collage_context = "collage"   # Filename prefix for collage exports
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only make collages wider
//! [collage]
//! width = 1800
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::annotation::THICKNESS_RANGE;
use crate::naming::sanitize_context;
use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "retouch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `retouch.toml`.
///
/// Passed explicitly to whatever needs it; there is no global config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Pen defaults for new strokes.
    pub annotation: AnnotationConfig,
    /// Collage canvas geometry and colors.
    pub collage: CollageConfig,
    /// Export filename contexts.
    pub export: ExportConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.annotation.thickness;
        if !(t > 0.0 && t <= THICKNESS_RANGE.1) {
            return Err(ConfigError::Validation(format!(
                "annotation.thickness must be in (0, {}]",
                THICKNESS_RANGE.1
            )));
        }
        let c = &self.collage;
        if c.width == 0 || c.height == 0 {
            return Err(ConfigError::Validation(
                "collage.width and collage.height must be non-zero".into(),
            ));
        }
        if c.gap.saturating_mul(2) >= c.width.min(c.height) {
            return Err(ConfigError::Validation(
                "collage.gap must be smaller than half the shorter canvas side".into(),
            ));
        }
        for (key, value) in [
            ("export.edit_context", &self.export.edit_context),
            ("export.collage_context", &self.export.collage_context),
        ] {
            if sanitize_context(value).is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key} must contain at least one letter or digit"
                )));
            }
        }
        Ok(())
    }
}

/// Default pen for new strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationConfig {
    pub color: Color,
    pub thickness: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            color: Color::rgb(0xff, 0x00, 0x00),
            thickness: 5.0,
        }
    }
}

/// Collage canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollageConfig {
    pub width: u32,
    pub height: u32,
    /// Pixels between neighbouring slots and around the canvas edge.
    pub gap: u32,
    pub background: Color,
    /// Fill for slots without an image.
    pub placeholder: Color,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1200,
            gap: 8,
            background: Color::rgb(0xff, 0xff, 0xff),
            placeholder: Color::rgb(0xe0, 0xe0, 0xe0),
        }
    }
}

/// Filename contexts for exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub edit_context: String,
    pub collage_context: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            edit_context: "edited".to_string(),
            collage_context: "collage".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EngineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `retouch.toml` in the given directory.
///
/// A missing file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load config from an explicit file. Unlike [`load_config`], the file must exist.
pub fn load_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `retouch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Retouch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as retouch.toml in the working directory, or pass
# --config <FILE>. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Annotation
# ---------------------------------------------------------------------------
[annotation]
# Stroke color for new annotations (#rgb, #rrggbb or #rrggbbaa).
color = "#ff0000"

# Stroke thickness in pixels, up to 200.
thickness = 5.0

# ---------------------------------------------------------------------------
# Collage
# ---------------------------------------------------------------------------
[collage]
# Output canvas size in pixels.
width = 1200
height = 1200

# Space between slots and around the canvas edge, in pixels.
gap = 8

# Canvas color visible through the gaps.
background = "#ffffff"

# Fill for slots that have no image yet.
placeholder = "#e0e0e0"

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Filename prefixes: <context>-<unix millis>.png
edit_context = "edited"
collage_context = "collage"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for the batch command.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.annotation.color, Color::rgb(255, 0, 0));
        assert_eq!(config.annotation.thickness, 5.0);
        assert_eq!((config.collage.width, config.collage.height), (1200, 1200));
        assert_eq!(config.export.edit_context, "edited");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[collage]
gap = 0
placeholder = "#333"
"##;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.collage.gap, 0);
        assert_eq!(config.collage.placeholder, Color::rgb(0x33, 0x33, 0x33));
        // Unspecified values should be defaults
        assert_eq!(config.collage.width, 1200);
        assert_eq!(config.annotation.thickness, 5.0);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r##"
[annotation]
color = "#00ff0080"

[export]
collage_context = "board"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.annotation.color, Color::rgba(0, 255, 0, 0x80));
        assert_eq!(config.export.collage_context, "board");
        assert_eq!(config.export.edit_context, "edited");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_file_requires_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_file_any_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("studio.toml");
        fs::write(&path, "[collage]\nwidth = 600\nheight = 400\n").unwrap();
        let config = load_config_file(&path).unwrap();
        assert_eq!((config.collage.width, config.collage.height), (600, 400));
    }

    #[test]
    fn bad_color_is_parse_error() {
        let toml = "[annotation]\ncolor = \"red\"\n";
        assert!(toml::from_str::<EngineConfig>(toml).is_err());
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let threads = effective_threads(&ProcessingConfig {
            max_processes: None,
        });
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(threads, cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let threads = effective_threads(&ProcessingConfig {
            max_processes: Some(99999),
        });
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(threads, cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"gap = 8"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"gap = 2"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("gap").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[collage]
width = 1200
height = 1200
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[collage]\nwidth = 10\n").unwrap();
        let merged = merge_toml(base, overlay);
        let collage = merged.get("collage").unwrap();
        assert_eq!(collage.get("width").unwrap().as_integer(), Some(10));
        assert_eq!(collage.get("height").unwrap().as_integer(), Some(1200));
    }

    // =========================================================================
    // Unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml = "[collage]\nwdith = 10\n";
        assert!(toml::from_str::<EngineConfig>(toml).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = "[filters]\nbrightness = 10\n";
        assert!(toml::from_str::<EngineConfig>(toml).is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[export]\nformat = \"jpg\"\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_thickness_bounds() {
        let mut config = EngineConfig::default();
        config.annotation.thickness = 200.0;
        assert!(config.validate().is_ok());
        config.annotation.thickness = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.annotation.thickness = 201.0;
        assert!(config.validate().is_err());
        config.annotation.thickness = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_canvas() {
        let mut config = EngineConfig::default();
        config.collage.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_gap_too_large() {
        let mut config = EngineConfig::default();
        config.collage.width = 100;
        config.collage.gap = 50;
        assert!(config.validate().is_err());
        config.collage.gap = 49;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_context_must_survive_sanitizing() {
        let mut config = EngineConfig::default();
        config.export.edit_context = "???".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("export.edit_context"));
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[collage]\nwidth = 0\n").unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: EngineConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[annotation]", "[collage]", "[export]", "[processing]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        for section in ["annotation", "collage", "export", "processing"] {
            assert!(val.get(section).is_some(), "missing {section}");
        }
    }
}
