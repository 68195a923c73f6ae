//! Site assembly: the page list, the static file list, and copying.
//!
//! This is the layer a renderer talks to. It walks the tree from a node and
//! produces:
//!
//! - [`pages`]: one [`Page`] per directory and displayable media node, with
//!   its layout and full [`PageView`].
//! - [`static_files`]: every original media file plus every derived
//!   artifact, generated on the way.
//!
//! # Build Order
//!
//! [`build`] runs static files first. That is where conversions happen (in
//! parallel, on the rayon pool) and where `force` applies. Page building
//! asks for the same artifacts afterwards and finds them already handled in
//! this run.
//!
//! ```text
//! static_files(force)  ─▶  copy_static_files  ─▶  pages
//! ```

use crate::artifact::{ArtifactKey, ArtifactStats};
use crate::gallery::{Gallery, GalleryError};
use crate::naming::RelPath;
use crate::node::{MediaKind, MediaNode};
use crate::page::PageView;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Template a page is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    GalleryIndex,
    GallerySingleImage,
    GallerySingleVideo,
    /// A directory's `index.*` file replaces the generated listing.
    Custom(RelPath),
}

impl Layout {
    fn for_node(node: &MediaNode) -> Result<Self, GalleryError> {
        match node.classify() {
            MediaKind::Directory => Ok(match node.index_child()? {
                Some(index) => Layout::Custom(index.relative_path().clone()),
                None => Layout::GalleryIndex,
            }),
            MediaKind::Image => Ok(Layout::GallerySingleImage),
            MediaKind::Video => Ok(Layout::GallerySingleVideo),
            _ => Err(GalleryError::UnknownPageType(node.relative_path().clone())),
        }
    }
}

/// One page to render.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Output path relative to the site root.
    pub path: RelPath,
    pub layout: Layout,
    #[serde(rename = "data")]
    pub view: PageView,
}

/// One file to place into the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticFile {
    pub source: PathBuf,
    /// Relative to the output directory.
    pub destination: RelPath,
}

/// Pages for `node` and, recursively, its directories and media.
pub fn pages(node: &MediaNode) -> Result<Vec<Page>, GalleryError> {
    let mut out = Vec::new();
    collect_pages(node, &mut out)?;
    Ok(out)
}

fn collect_pages(node: &MediaNode, out: &mut Vec<Page>) -> Result<(), GalleryError> {
    out.push(Page {
        path: node.page_path(),
        layout: Layout::for_node(node)?,
        view: PageView::full(node)?,
    });
    for child in node.directories()?.into_iter().chain(node.media()?) {
        collect_pages(&child, out)?;
    }
    Ok(())
}

enum Entry {
    Original(RelPath),
    Artifact(ArtifactKey),
}

/// Originals and derived artifacts under `node`, deduplicated.
///
/// Missing artifacts are generated in parallel before returning; with
/// `force` every artifact is regenerated.
pub fn static_files(node: &MediaNode, force: bool) -> Result<Vec<StaticFile>, GalleryError> {
    let mut entries = Vec::new();
    collect_entries(node, &mut entries)?;

    let mut seen = HashSet::new();
    let keys: Vec<&ArtifactKey> = entries
        .iter()
        .filter_map(|e| match e {
            Entry::Artifact(key) => Some(key),
            Entry::Original(_) => None,
        })
        .filter(|key| seen.insert(*key))
        .collect();
    info!(artifacts = keys.len(), force, "generating artifacts");

    let gallery = node.gallery();
    keys.par_iter().try_for_each(|key| {
        gallery
            .node_at(key.source.clone())
            .request_artifact((*key).clone(), force)
            .map(|_| ())
    })?;

    let mut destinations = HashSet::new();
    let files: Vec<StaticFile> = entries
        .into_iter()
        .map(|e| {
            let (source, destination) = match e {
                Entry::Original(rel) => (rel.clone(), rel),
                Entry::Artifact(key) => {
                    let dest = key.destination();
                    (dest.clone(), dest)
                }
            };
            StaticFile {
                source: source.to_path(gallery.root()),
                destination,
            }
        })
        .filter(|f| destinations.insert(f.destination.clone()))
        .collect();
    debug!(files = files.len(), "collected static files");
    Ok(files)
}

fn collect_entries(node: &MediaNode, out: &mut Vec<Entry>) -> Result<(), GalleryError> {
    let config = node.gallery().config();
    let rel = node.relative_path();
    match node.classify() {
        MediaKind::Image => {
            out.push(Entry::Original(rel.clone()));
            out.push(Entry::Artifact(ArtifactKey::thumbnail(
                rel.clone(),
                config.thumbnails.size,
            )));
            out.push(Entry::Artifact(ArtifactKey::variant(
                rel.clone(),
                config.previews.width,
                config.previews.height,
            )));
        }
        MediaKind::Video => {
            out.push(Entry::Original(rel.clone()));
            if let Some(poster) = node.paired_image()? {
                collect_entries(&poster, out)?;
            }
        }
        _ => {}
    }
    for child in node.directories()?.into_iter().chain(node.media()?) {
        collect_entries(&child, out)?;
    }
    Ok(())
}

/// Result of [`copy_static_files`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: usize,
    pub up_to_date: usize,
}

/// Copy files into `output_dir`, skipping destinations that are current.
///
/// A destination is current when it has the source's size and is not older.
pub fn copy_static_files(
    files: &[StaticFile],
    output_dir: &Path,
) -> Result<CopyReport, GalleryError> {
    let mut report = CopyReport::default();
    for file in files {
        let target = file.destination.to_path(output_dir);
        if is_current(&file.source, &target)? {
            report.up_to_date += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file.source, &target)?;
        report.copied += 1;
    }
    Ok(report)
}

fn is_current(source: &Path, target: &Path) -> Result<bool, GalleryError> {
    let Ok(target_meta) = fs::metadata(target) else {
        return Ok(false);
    };
    let source_meta = fs::metadata(source)?;
    Ok(target_meta.len() == source_meta.len()
        && target_meta.modified()? >= source_meta.modified()?)
}

/// Summary of a [`build`].
#[derive(Debug)]
pub struct BuildReport {
    pub pages: Vec<Page>,
    pub static_files: usize,
    pub copy: CopyReport,
    pub artifacts: ArtifactStats,
}

/// Generate artifacts, copy static files, then build every page.
pub fn build(gallery: &Gallery, output_dir: &Path, force: bool) -> Result<BuildReport, GalleryError> {
    let root = gallery.root_node();

    let files = static_files(&root, force)?;
    info!(count = files.len(), output = %output_dir.display(), "copying static files");
    let copy = copy_static_files(&files, output_dir)?;

    let pages = pages(&root)?;
    info!(count = pages.len(), "built pages");

    Ok(BuildReport {
        pages,
        static_files: files.len(),
        copy,
        artifacts: gallery.artifacts().stats(),
    })
}

/// Write the page list as pretty JSON.
pub fn write_pages_json(pages: &[Page], path: &Path) -> Result<(), GalleryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(pages)?;
    fs::write(path, json)?;
    Ok(())
}
