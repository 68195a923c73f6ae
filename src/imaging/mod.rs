//! Image conversion through an external tool.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only) |
//! | **Thumbnail** | `convert … -thumbnail WxH^ -extent WxH` |
//! | **Video thumbnail** | thumbnail + overlay composite, bottom-left |
//! | **Resize** | `convert … -resize WxH>` |
//!
//! The module is split into:
//! - **Calculations**: pure geometry-string helpers (unit testable)
//! - **Parameters**: data structures describing conversions
//! - **Backend**: [`ImageBackend`] trait + [`MagickBackend`]
//! - **Badge**: the built-in play overlay for video thumbnails

pub mod backend;
pub mod badge;
mod calculations;
pub mod magick;
mod params;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use magick::MagickBackend;
pub use params::{Quality, ResizeParams, ThumbnailParams};
