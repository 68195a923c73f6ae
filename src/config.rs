//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the gallery root; it is classified as "other" by the tree walker, so it
//! never shows up in a listing.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! base_url = ""             # URL prefix for every page and file URL
//! title = ""                # Root page title (empty = root directory name)
//!
//! [thumbnails]
//! size = 200                # Square thumbnail edge in pixels
//! representative = "first"  # Directory thumbnail: "first" or "random" image
//!
//! [previews]
//! width = 1280              # Bounding box of the large preview variant
//! height = 1280
//!
//! [convert]
//! program = "convert"       # ImageMagick executable
//! quality = 80              # JPEG quality (1-100)
//! filter = "Lanczos"        # Resampling filter
//! overlay = "play.png"      # Video thumbnail badge, relative to the gallery root
//!                           # (omit for the built-in play badge)
//!
//! [processing]
//! max_processes = 4         # Max parallel conversions (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [thumbnails]
//! size = 240
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// URL prefix and root title.
    pub site: SiteSection,
    /// Thumbnail size and directory representative selection.
    pub thumbnails: ThumbnailsConfig,
    /// Bounding box for the large preview variant.
    pub previews: PreviewsConfig,
    /// External conversion tool settings.
    pub convert: ConvertConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.size == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.size must be non-zero".into(),
            ));
        }
        if self.previews.width == 0 || self.previews.height == 0 {
            return Err(ConfigError::Validation(
                "previews.width and previews.height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.convert.quality) {
            return Err(ConfigError::Validation(
                "convert.quality must be 1-100".into(),
            ));
        }
        if self.convert.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "convert.program must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// URL and title settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Prefix for every generated URL, e.g. `"/gallery"`. No trailing slash.
    pub base_url: String,
    /// Title of the root page. Empty means the root directory's name.
    pub title: String,
}

/// How a directory picks the image that represents it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representative {
    /// First image of the recursive image list. Stable across runs.
    #[default]
    First,
    /// A random image, chosen once per run.
    Random,
}

/// Thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Edge length of the square thumbnail crop.
    pub size: u32,
    pub representative: Representative,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            size: 200,
            representative: Representative::First,
        }
    }
}

/// Large preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewsConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewsConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 1280,
        }
    }
}

/// External conversion tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Executable name or path of ImageMagick's `convert`.
    pub program: String,
    /// JPEG quality passed as `-quality`.
    pub quality: u32,
    /// Resampling filter passed as `-filter`.
    pub filter: String,
    /// Badge for video thumbnails. Relative paths resolve against the
    /// gallery root; `None` uses the built-in play badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            program: "convert".to_string(),
            quality: 80,
            filter: "Lanczos".to_string(),
            overlay: None,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversions.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
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
    toml::Value::try_from(SiteConfig::default())
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the gallery root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# media-gal configuration
# =======================
# Place this file in the gallery root. All settings are optional;
# values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Prefix for every page and file URL, e.g. "/gallery". No trailing slash.
base_url = ""

# Title of the root page. Empty uses the gallery directory's name.
title = ""

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Edge of the square, center-cropped thumbnail in pixels.
size = 200

# Which image represents a directory: "first" (stable) or "random".
representative = "first"

# ---------------------------------------------------------------------------
# Large previews
# ---------------------------------------------------------------------------
[previews]
# Bounding box; images are fit inside it and never upscaled.
width = 1280
height = 1280

# ---------------------------------------------------------------------------
# Conversion tool
# ---------------------------------------------------------------------------
[convert]
# ImageMagick executable.
program = "convert"

# JPEG quality of every derived file (1-100).
quality = 80

# Resampling filter.
filter = "Lanczos"

# Badge composited onto the bottom-left corner of video thumbnails.
# Relative paths resolve against the gallery root. When unset, a built-in
# play badge is written to resized/.play-badge.png and used instead.
# overlay = "play.png"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversions.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
