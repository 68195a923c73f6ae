//! Built-in play badge for video thumbnails.
//!
//! Used when `convert.overlay` is not configured. The badge is a
//! translucent dark disc with a white triangle pointing right, drawn with
//! the `image` crate and saved as PNG so the alpha channel survives the
//! composite.

use super::backend::BackendError;
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

/// Edge length of the badge in pixels.
pub const BADGE_SIZE: u32 = 48;

const DISC: Rgba<u8> = Rgba([0, 0, 0, 160]);
const TRIANGLE: Rgba<u8> = Rgba([255, 255, 255, 230]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Render the badge at `size` x `size`.
pub fn play_badge(size: u32) -> RgbaImage {
    let s = size as f32;
    let center = s / 2.0;
    let radius = s / 2.0 - 1.0;

    // triangle: left edge at x0, apex at x1, half height h at the left edge
    let x0 = s * 0.38;
    let x1 = s * 0.72;
    let h = s * 0.2;

    RgbaImage::from_fn(size, size, |x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let (dx, dy) = (px - center, py - center);
        if dx * dx + dy * dy > radius * radius {
            return CLEAR;
        }
        if px >= x0 && px <= x1 {
            let half = h * (x1 - px) / (x1 - x0);
            if (py - center).abs() <= half {
                return TRIANGLE;
            }
        }
        DISC
    })
}

/// Save the badge as PNG at `path`.
pub fn write_play_badge(path: &Path) -> Result<(), BackendError> {
    play_badge(BADGE_SIZE)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| BackendError::ProcessingFailed(format!("Cannot write play badge: {e}")))
}
