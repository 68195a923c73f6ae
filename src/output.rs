//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entry leads with its positional index and name; details such as a
//! video's poster or a page's layout follow as indented context or after an
//! arrow. Entries that will not appear on any page are listed separately so
//! a typo'd extension or a video without poster is easy to spot.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Holiday (2 media, 1 gallery)
//! 001 trip/ (1 media)
//!     001 x.jpg
//! 001 a.mp4
//!     Poster: a.jpg
//! 002 b.png
//!
//! Skipped
//!     notes.txt (other)
//!     trip/clip.flv (video without poster)
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Holiday → index.html
//! 002 trip → trip/index.html
//! 003 x.jpg → trip/x.jpg.html
//!
//! Static files: 10 (10 copied, 0 up to date)
//! Artifacts: 6 generated
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions only read the gallery tree; they never write.

use crate::gallery::GalleryError;
use crate::node::{MediaKind, MediaNode};
use crate::site::{BuildReport, Layout};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, plural)
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the classified tree under `root`.
pub fn format_scan_output(root: &MediaNode) -> Result<Vec<String>, GalleryError> {
    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    let media = root.media()?;
    let galleries = root.directories()?;
    lines.push(format!(
        "{} ({} media, {})",
        root.base_name(),
        media.len(),
        plural(galleries.len(), "gallery", "galleries")
    ));
    walk(root, 0, &mut lines, &mut skipped)?;

    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        lines.extend(skipped);
    }
    Ok(lines)
}

fn walk(
    dir: &MediaNode,
    depth: usize,
    lines: &mut Vec<String>,
    skipped: &mut Vec<String>,
) -> Result<(), GalleryError> {
    for child in dir.children()? {
        let reason = match child.classify() {
            MediaKind::Other => Some("other"),
            MediaKind::Video if !child.is_displayable_media() => Some("video without poster"),
            _ => None,
        };
        if let Some(reason) = reason {
            skipped.push(format!("    {} ({})", child.relative_path(), reason));
        }
    }

    for (i, sub) in dir.directories()?.iter().enumerate() {
        lines.push(format!(
            "{}{} {}/ ({} media)",
            indent(depth),
            format_index(i + 1),
            sub.base_name(),
            sub.media()?.len()
        ));
        walk(sub, depth + 1, lines, skipped)?;
    }

    for (i, item) in dir.media()?.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(depth),
            format_index(i + 1),
            item.base_name()
        ));
        if item.is_video()
            && let Some(poster) = item.paired_image()?
        {
            lines.push(format!("{}Poster: {}", indent(depth + 1), poster.base_name()));
        }
    }
    Ok(())
}

/// Print scan output to stdout.
pub fn print_scan_output(root: &MediaNode) -> Result<(), GalleryError> {
    for line in format_scan_output(root)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Build output
// ============================================================================

fn layout_note(layout: &Layout) -> Option<String> {
    match layout {
        Layout::Custom(index) => Some(format!(" (custom: {})", index)),
        _ => None,
    }
}

/// Format the page list and the file/artifact summary of a build.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            format!(
                "{} {} \u{2192} {}{}",
                format_index(i + 1),
                page.view.title,
                page.path,
                layout_note(&page.layout).unwrap_or_default()
            )
        })
        .collect();

    lines.push(String::new());
    lines.push(format!(
        "Static files: {} ({} copied, {} up to date)",
        report.static_files, report.copy.copied, report.copy.up_to_date
    ));
    lines.push(format!("Artifacts: {}", report.artifacts));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
