//! Pure geometry helpers for conversion-tool arguments.
//!
//! All functions here are pure and testable without any I/O or images.
//! They render the ImageMagick geometry strings used by the recipes in
//! [`magick`](super::magick).

/// Geometry that fills the box, overflowing one edge: `WxH^`.
///
/// Used with `-thumbnail` before `-extent` crops the overflow.
pub fn fill_geometry(width: u32, height: u32) -> String {
    format!("{}x{}^", width, height)
}

/// Exact box geometry: `WxH`.
pub fn extent_geometry(width: u32, height: u32) -> String {
    format!("{}x{}", width, height)
}

/// Geometry that fits inside the box and only ever shrinks: `WxH>`.
pub fn shrink_geometry(width: u32, height: u32) -> String {
    format!("{}x{}>", width, height)
}

/// JPEG decoder size hint at twice the target box.
///
/// Lets libjpeg decode at a reduced scale while keeping enough pixels
/// for a clean downsample.
pub fn decode_size_hint(width: u32, height: u32) -> String {
    format!(
        "jpeg:size={}x{}",
        width.saturating_mul(2),
        height.saturating_mul(2)
    )
}
