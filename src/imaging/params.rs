//! Parameter types for conversion operations.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between the artifact layer (which decides which files to create and where)
//! and the [`backend`](super::backend) (which runs the conversion tool). The
//! split lets tests swap in a recording mock without touching artifact logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1-100, default 80). Clamped on construction.
//! - [`ThumbnailParams`]: center-cropped, exact-size thumbnail, optionally
//!   with an overlay badge composited bottom-left.
//! - [`ResizeParams`]: fit-within resize that never upscales.

use std::path::PathBuf;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a bounded resize: fit inside `width`×`height`, never upscale.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a thumbnail: fill `width`×`height`, then center-crop.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    /// Badge composited onto the bottom-left corner (video thumbnails).
    pub overlay: Option<PathBuf>,
}
