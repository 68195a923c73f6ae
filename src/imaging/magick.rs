//! ImageMagick backend: runs `convert` as an external process.
//!
//! ## Recipes
//!
//! | Operation | Arguments |
//! |---|---|
//! | Thumbnail | `-define jpeg:size=2Wx2H src -thumbnail WxH^ -gravity center -extent WxH` + common |
//! | Video thumbnail | thumbnail + `-write mpr:orig +delete mpr:orig overlay -gravity SouthWest -composite` |
//! | Resize | `src -resize WxH>` + common |
//!
//! Common settings: `-quality Q -strip -colorspace rgb -filter F`.
//!
//! Dimensions are read from the file header with the `image` crate, so
//! identifying a file never spawns a process.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{decode_size_hint, extent_geometry, fill_geometry, shrink_geometry};
use super::params::{Quality, ResizeParams, ThumbnailParams};
use crate::config::ConvertConfig;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Backend that shells out to ImageMagick.
#[derive(Debug, Clone)]
pub struct MagickBackend {
    program: String,
    filter: String,
}

impl MagickBackend {
    pub fn new(program: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            filter: filter.into(),
        }
    }

    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(config.program.clone(), config.filter.clone())
    }

    fn run(&self, args: Vec<OsString>) -> Result<(), BackendError> {
        debug!(program = %self.program, ?args, "running conversion");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => BackendError::ToolNotFound(self.program.clone()),
                _ => BackendError::Io(e),
            })?;
        if !output.status.success() {
            return Err(BackendError::ProcessingFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Settings shared by every recipe, in the order the tool expects them.
fn common_args(quality: Quality, filter: &str) -> Vec<OsString> {
    vec![
        "-quality".into(),
        quality.value().to_string().into(),
        "-strip".into(),
        "-colorspace".into(),
        "rgb".into(),
        "-filter".into(),
        filter.into(),
    ]
}

/// Argument list for the cropped (and optionally badged) thumbnail recipe.
pub fn thumbnail_args(params: &ThumbnailParams, filter: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-define".into(),
        decode_size_hint(params.width, params.height).into(),
        params.source.clone().into(),
        "-thumbnail".into(),
        fill_geometry(params.width, params.height).into(),
        "-gravity".into(),
        "center".into(),
        "-extent".into(),
        extent_geometry(params.width, params.height).into(),
    ];
    args.extend(common_args(params.quality, filter));
    if let Some(overlay) = &params.overlay {
        args.extend([
            "-write".into(),
            "mpr:orig".into(),
            "+delete".into(),
            "mpr:orig".into(),
            overlay.clone().into(),
            "-gravity".into(),
            "SouthWest".into(),
            "-composite".into(),
        ]);
    }
    args.push(params.output.clone().into());
    args
}

/// Argument list for the bounded variant recipe.
pub fn resize_args(params: &ResizeParams, filter: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        params.source.clone().into(),
        "-resize".into(),
        shrink_geometry(params.width, params.height).into(),
    ];
    args.extend(common_args(params.quality, filter));
    args.push(params.output.clone().into());
    args
}

impl ImageBackend for MagickBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        if let Some(overlay) = &params.overlay
            && !overlay.exists()
        {
            return Err(BackendError::ProcessingFailed(format!(
                "Overlay image not found: {}",
                overlay.display()
            )));
        }
        self.run(thumbnail_args(params, &self.filter))
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        self.run(resize_args(params, &self.filter))
    }
}
