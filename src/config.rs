//! Configuration module.
//!
//! Handles loading, validating, and merging `shotframe.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [editor]
//! padding = 24.0            # Pixels added on every side of the foreground
//! corner_radius = 0.0       # Corner rounding, in source pixels
//! aspect_ratio = "free"     # free | square | portrait | landscape
//! background = "gradient"   # gradient | solid
//! solid_color = "white"     # see `shotframe palette`
//! gradient = "sunset"       # see `shotframe palette`
//!
//! [shadow]
//! enabled = false
//! offset_x = 0.0
//! offset_y = 10.0
//! blur = 20.0
//! opacity = 0.3
//!
//! [preview]
//! debounce_ms = 50          # Quiet period before a preview re-render
//!
//! [processing]
//! max_processes = 4         # Max parallel exports (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only turn the shadow on
//! [shadow]
//! enabled = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::editor::SessionOptions;
use crate::imaging::{
    AspectRatio, BackgroundType, EditingParameters, GradientId, NormalizedRect, ShadowSettings,
    SolidId,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "shotframe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `shotframe.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShotframeConfig {
    /// Starting values for the editing parameters.
    pub editor: EditorConfig,
    /// Drop shadow defaults.
    pub shadow: ShadowConfig,
    /// Live preview behaviour.
    pub preview: PreviewConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ShotframeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("editor.padding", self.editor.padding)?;
        non_negative("editor.corner_radius", self.editor.corner_radius)?;
        non_negative("shadow.blur", self.shadow.blur)?;
        if !self.shadow.offset_x.is_finite() || !self.shadow.offset_y.is_finite() {
            return Err(ConfigError::Validation(
                "shadow.offset_x and shadow.offset_y must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.shadow.opacity) {
            return Err(ConfigError::Validation(
                "shadow.opacity must be between 0 and 1".into(),
            ));
        }
        if !(1..=1000).contains(&self.preview.debounce_ms) {
            return Err(ConfigError::Validation(
                "preview.debounce_ms must be 1-1000".into(),
            ));
        }
        Ok(())
    }

    /// Editing parameters a session starts from.
    pub fn editing_parameters(&self) -> EditingParameters {
        EditingParameters {
            crop_rect: NormalizedRect::FULL,
            corner_radius: self.editor.corner_radius,
            padding: self.editor.padding,
            shadow: ShadowSettings {
                enabled: self.shadow.enabled,
                offset: (self.shadow.offset_x, self.shadow.offset_y),
                blur: self.shadow.blur,
                opacity: self.shadow.opacity,
            },
            background: self.editor.background,
            solid_color: self.editor.solid_color,
            gradient: self.editor.gradient,
            aspect_ratio: self.editor.aspect_ratio,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            debounce: Duration::from_millis(self.preview.debounce_ms),
            defaults: self.editing_parameters(),
        }
    }
}

fn non_negative(key: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{key} must be a non-negative number"
        )))
    }
}

/// Editing parameter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub padding: f32,
    pub corner_radius: f32,
    pub aspect_ratio: AspectRatio,
    pub background: BackgroundType,
    pub solid_color: SolidId,
    pub gradient: GradientId,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let params = EditingParameters::default();
        Self {
            padding: params.padding,
            corner_radius: params.corner_radius,
            aspect_ratio: params.aspect_ratio,
            background: params.background,
            solid_color: params.solid_color,
            gradient: params.gradient,
        }
    }
}

/// Drop shadow defaults. The shadow colour is always black.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowConfig {
    pub enabled: bool,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub opacity: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        let shadow = ShadowSettings::default();
        Self {
            enabled: shadow.enabled,
            offset_x: shadow.offset.0,
            offset_y: shadow.offset.1,
            blur: shadow.blur,
            opacity: shadow.opacity,
        }
    }
}

/// Live preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Mutations closer together than this collapse into one render.
    pub debounce_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel export workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least one
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
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ShotframeConfig::default())?)
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

/// Read a config file as a raw TOML value.
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
) -> Result<ShotframeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ShotframeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// A missing file yields the stock defaults. Unknown keys and out-of-range
/// values are errors.
pub fn load_config(path: &Path) -> Result<ShotframeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), ?config, "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `shotframe.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# shotframe configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Command-line edit flags (--padding, --shadow, ...) override these values.

# ---------------------------------------------------------------------------
# Editing defaults
# ---------------------------------------------------------------------------
[editor]
# Space added on every side of the cropped image, in output pixels.
padding = 24.0

# Corner rounding in source pixels. Clamped to half the shorter side.
corner_radius = 0.0

# Canvas shape: "free", "square" (1:1), "portrait" (9:16), "landscape" (16:9).
aspect_ratio = "free"

# Canvas fill: "gradient" or "solid".
background = "gradient"

# Swatch and gradient names; run `shotframe palette` for the full list.
solid_color = "white"
gradient = "sunset"

# ---------------------------------------------------------------------------
# Drop shadow (always black)
# ---------------------------------------------------------------------------
[shadow]
enabled = false
offset_x = 0.0
offset_y = 10.0

# Gaussian blur sigma, in pixels. Values above 500 act as 500.
blur = 20.0

# 0 = invisible, 1 = fully opaque.
opacity = 0.3

# ---------------------------------------------------------------------------
# Live preview
# ---------------------------------------------------------------------------
[preview]
# Parameter changes closer together than this collapse into one render (1-1000).
debounce_ms = 50

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel exports for `shotframe batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
