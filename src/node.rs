//! Gallery tree nodes.
//!
//! A [`MediaNode`] is one filesystem entry under the gallery root, addressed
//! by its [`RelPath`]. Nodes are value handles: equality and hashing use the
//! (root, relative path) pair, and everything derived from the filesystem is
//! memoized in the gallery's shared cache.
//!
//! ## Classification
//!
//! | Kind | Rule |
//! |------|------|
//! | Directory | a directory (except one named `resized`) |
//! | Image | `png`, `jpg`, `jpeg`, any case |
//! | Video | `mp4`, `flv`, any case |
//! | Other | anything else, never listed |
//! | Missing | nothing on disk at that path |
//!
//! ## Pairing
//!
//! An image and a video with the same name apart from the extension are a
//! pair: the image is the video's poster. Lookup tries a fixed candidate
//! list in order (the case variants are listed explicitly, so a
//! `clip.Mp4` is not found):
//!
//! ```text
//! image -> video   mp4 flv MP4 FLV
//! video -> image   jpg jpeg png JPG JPEG PNG
//! ```
//!
//! A paired image is not listed as media: the video takes its slot, and a
//! video without a poster is not listed at all.
//!
//! ## Parents
//!
//! The parent of a node is computed from its path. Listings only ever walk
//! downward, so no traversal can loop.

use crate::artifact::{ArtifactKey, ArtifactOp};
use crate::gallery::{Gallery, GalleryError};
use crate::imaging::{Dimensions, Quality, ResizeParams, ThumbnailParams};
use crate::config::Representative;
use crate::naming::RelPath;
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reserved directory holding derived artifacts, next to their sources.
pub const RESIZED_DIR: &str = "resized";

const VIDEO_PAIR_EXTENSIONS: &[&str] = &["mp4", "flv", "MP4", "FLV"];
const IMAGE_PAIR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

/// What a node is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Missing,
    Directory,
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Missing => "missing",
            MediaKind::Directory => "directory",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }

    fn from_extension(ext: Option<&str>) -> Self {
        let Some(ext) = ext else {
            return MediaKind::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" => MediaKind::Image,
            "mp4" | "flv" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the gallery tree.
#[derive(Clone)]
pub struct MediaNode {
    gallery: Gallery,
    rel: RelPath,
}

impl PartialEq for MediaNode {
    fn eq(&self, other: &Self) -> bool {
        self.rel == other.rel && self.gallery.same_root(&other.gallery)
    }
}

impl Eq for MediaNode {}

impl Hash for MediaNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gallery.root().hash(state);
        self.rel.hash(state);
    }
}

impl fmt::Debug for MediaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaNode({})", self.rel)
    }
}

impl MediaNode {
    pub(crate) fn new(gallery: Gallery, rel: RelPath) -> Self {
        Self { gallery, rel }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn relative_path(&self) -> &RelPath {
        &self.rel
    }

    pub fn full_path(&self) -> PathBuf {
        self.rel.to_path(self.gallery.root())
    }

    pub fn is_root(&self) -> bool {
        self.rel.is_root()
    }

    /// File name including extension; the root directory's name for the root.
    pub fn base_name(&self) -> &str {
        if self.rel.is_root() {
            self.gallery.root_name()
        } else {
            self.rel.file_name()
        }
    }

    /// Containing directory, `None` for the root.
    pub fn parent(&self) -> Option<MediaNode> {
        self.rel.parent().map(|p| self.gallery.node_at(p))
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify the entry. Never fails: unreadable paths are `Missing`.
    pub fn classify(&self) -> MediaKind {
        let cache = &self.gallery.cache().kinds;
        if let Some(kind) = cache.get(&self.rel) {
            return kind;
        }
        let kind = self.stat_kind();
        // Artifacts appear during a run; only settled kinds are remembered.
        if kind == MediaKind::Missing {
            return kind;
        }
        cache.get_or_insert_with(&self.rel, || kind)
    }

    fn stat_kind(&self) -> MediaKind {
        let Ok(meta) = fs::metadata(self.full_path()) else {
            return MediaKind::Missing;
        };
        if meta.is_dir() {
            if !self.is_root() && self.rel.file_name() == RESIZED_DIR {
                MediaKind::Other
            } else {
                MediaKind::Directory
            }
        } else {
            MediaKind::from_extension(self.rel.extension())
        }
    }

    pub fn is_directory(&self) -> bool {
        self.classify() == MediaKind::Directory
    }

    pub fn is_image(&self) -> bool {
        self.classify() == MediaKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.classify() == MediaKind::Video
    }

    fn expect_kind(&self, expected: MediaKind) -> Result<(), GalleryError> {
        let found = self.classify();
        if found != expected {
            return Err(GalleryError::KindMismatch {
                path: self.rel.clone(),
                expected: expected.as_str(),
                found,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Directory entries in byte order, without dotfiles and `resized`.
    ///
    /// Empty for anything that is not a directory.
    pub fn children(&self) -> Result<Vec<MediaNode>, GalleryError> {
        if !self.is_directory() {
            return Ok(Vec::new());
        }
        let rels = self
            .gallery
            .cache()
            .children
            .get_or_try_insert_with(&self.rel, || self.read_children())?;
        Ok(rels.into_iter().map(|r| self.gallery.node_at(r)).collect())
    }

    fn read_children(&self) -> Result<Vec<RelPath>, GalleryError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.full_path())? {
            let name = match entry?.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(dir = %self.rel, name = ?raw, "skipping entry with non-UTF-8 name");
                    continue;
                }
            };
            if name.starts_with('.') || name == RESIZED_DIR {
                continue;
            }
            names.push(name);
        }
        names.sort();
        debug!(dir = %self.rel, entries = names.len(), "listed directory");
        Ok(names.iter().map(|n| self.rel.join(n)).collect())
    }

    /// Displayable media children, in child order.
    pub fn media(&self) -> Result<Vec<MediaNode>, GalleryError> {
        Ok(self
            .children()?
            .into_iter()
            .filter(MediaNode::is_displayable_media)
            .collect())
    }

    pub fn directories(&self) -> Result<Vec<MediaNode>, GalleryError> {
        Ok(self
            .children()?
            .into_iter()
            .filter(MediaNode::is_directory)
            .collect())
    }

    /// Direct image children, posters included.
    pub fn images(&self) -> Result<Vec<MediaNode>, GalleryError> {
        Ok(self
            .children()?
            .into_iter()
            .filter(MediaNode::is_image)
            .collect())
    }

    /// Own images first, then each subdirectory's, depth-first in child order.
    ///
    /// May be empty; see [`representative_thumbnail`](Self::representative_thumbnail).
    pub fn all_images_recursive(&self) -> Result<Vec<MediaNode>, GalleryError> {
        if !self.is_directory() {
            return Ok(Vec::new());
        }
        let rels = self
            .gallery
            .cache()
            .all_images
            .get_or_try_insert_with(&self.rel, || {
                let mut rels: Vec<RelPath> =
                    self.images()?.into_iter().map(|n| n.rel).collect();
                for dir in self.directories()? {
                    rels.extend(dir.all_images_recursive()?.into_iter().map(|n| n.rel));
                }
                Ok::<_, GalleryError>(rels)
            })?;
        Ok(rels.into_iter().map(|r| self.gallery.node_at(r)).collect())
    }

    // =========================================================================
    // Pairing
    // =========================================================================

    /// The video this image is the poster of.
    pub fn paired_video(&self) -> Result<Option<MediaNode>, GalleryError> {
        self.expect_kind(MediaKind::Image)?;
        Ok(self.video_pair())
    }

    /// The poster image of this video.
    pub fn paired_image(&self) -> Result<Option<MediaNode>, GalleryError> {
        self.expect_kind(MediaKind::Video)?;
        Ok(self.image_pair())
    }

    fn video_pair(&self) -> Option<MediaNode> {
        let memo = &self.gallery.cache().paired_videos;
        memo.get_or_insert_with(&self.rel, || {
            self.find_pair(VIDEO_PAIR_EXTENSIONS, MediaKind::Video)
        })
        .map(|r| self.gallery.node_at(r))
    }

    fn image_pair(&self) -> Option<MediaNode> {
        let memo = &self.gallery.cache().paired_images;
        memo.get_or_insert_with(&self.rel, || {
            self.find_pair(IMAGE_PAIR_EXTENSIONS, MediaKind::Image)
        })
        .map(|r| self.gallery.node_at(r))
    }

    fn find_pair(&self, extensions: &[&str], kind: MediaKind) -> Option<RelPath> {
        extensions
            .iter()
            .map(|ext| self.rel.with_extension(ext))
            .find(|candidate| self.gallery.node_at(candidate.clone()).classify() == kind)
    }

    /// Whether the node gets a slot in its directory's media listing.
    pub fn is_displayable_media(&self) -> bool {
        match self.classify() {
            MediaKind::Image => self.video_pair().is_none(),
            MediaKind::Video => self.image_pair().is_some(),
            _ => false,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Previous entry of the parent's media listing.
    pub fn media_prev(&self) -> Result<Option<MediaNode>, GalleryError> {
        self.media_neighbor(|pos, _| pos.checked_sub(1))
    }

    /// Next entry of the parent's media listing.
    pub fn media_next(&self) -> Result<Option<MediaNode>, GalleryError> {
        self.media_neighbor(|pos, len| Some(pos + 1).filter(|&i| i < len))
    }

    fn media_neighbor(
        &self,
        step: impl FnOnce(usize, usize) -> Option<usize>,
    ) -> Result<Option<MediaNode>, GalleryError> {
        let Some(parent) = self.parent() else {
            return Ok(None);
        };
        let siblings = parent.media()?;
        let Some(pos) = siblings.iter().position(|n| n == self) else {
            return Ok(None);
        };
        Ok(step(pos, siblings.len()).and_then(|i| siblings.get(i).cloned()))
    }

    /// The image whose thumbnail stands for this node.
    ///
    /// Images stand for themselves, videos use their poster, directories pick
    /// from [`all_images_recursive`](Self::all_images_recursive) once per run.
    pub fn representative_thumbnail(&self) -> Result<MediaNode, GalleryError> {
        match self.classify() {
            MediaKind::Image => Ok(self.clone()),
            MediaKind::Video => self
                .image_pair()
                .ok_or_else(|| GalleryError::MissingPoster(self.rel.clone())),
            MediaKind::Directory => {
                let memo = &self.gallery.cache().representatives;
                let rel = memo.get_or_try_insert_with(&self.rel, || {
                    let images = self.all_images_recursive()?;
                    let chosen = match self.gallery.config().thumbnails.representative {
                        Representative::First => images.first(),
                        Representative::Random => images.choose(&mut rand::rng()),
                    };
                    chosen
                        .map(|n| n.rel.clone())
                        .ok_or_else(|| GalleryError::EmptyGallery(self.rel.clone()))
                })?;
                Ok(self.gallery.node_at(rel))
            }
            found => Err(GalleryError::KindMismatch {
                path: self.rel.clone(),
                expected: "image, video or directory",
                found,
            }),
        }
    }

    // =========================================================================
    // Derived artifacts
    // =========================================================================

    /// Square, center-cropped thumbnail. Posters get the overlay badge.
    pub fn request_thumbnail(&self, size: u32, force: bool) -> Result<MediaNode, GalleryError> {
        self.request_artifact(ArtifactKey::thumbnail(self.rel.clone(), size), force)
    }

    /// Fit-within variant, never upscaled.
    pub fn request_variant(
        &self,
        width: u32,
        height: u32,
        force: bool,
    ) -> Result<MediaNode, GalleryError> {
        self.request_artifact(ArtifactKey::variant(self.rel.clone(), width, height), force)
    }

    /// Produce the artifact for `key` unless it is already there.
    ///
    /// Returns the node of the produced file.
    pub(crate) fn request_artifact(
        &self,
        key: ArtifactKey,
        force: bool,
    ) -> Result<MediaNode, GalleryError> {
        self.expect_kind(MediaKind::Image)?;
        let config = self.gallery.config();
        let destination = key.destination();
        let backend = self.gallery.backend();
        let source = self.full_path();
        let quality = Quality::new(config.convert.quality);
        let overlay = match (key.op, self.video_pair()) {
            (ArtifactOp::Thumbnail, Some(_)) => Some(self.gallery.overlay_path()?),
            _ => None,
        };

        let status = self.gallery.artifacts().ensure(
            &key,
            &destination.to_path(self.gallery.root()),
            force,
            |output: &Path| match key.op {
                ArtifactOp::Thumbnail => backend.thumbnail(&ThumbnailParams {
                    source: source.clone(),
                    output: output.to_path_buf(),
                    width: key.width,
                    height: key.height,
                    quality,
                    overlay: overlay.clone(),
                }),
                ArtifactOp::Variant => backend.resize(&ResizeParams {
                    source: source.clone(),
                    output: output.to_path_buf(),
                    width: key.width,
                    height: key.height,
                    quality,
                }),
            },
        )?;
        debug!(artifact = %destination, ?status, "artifact ready");
        Ok(self.gallery.node_at(destination))
    }

    // =========================================================================
    // Page data helpers
    // =========================================================================

    /// Modification time; for directories the newest of its recursive images.
    pub fn date(&self) -> Result<DateTime<Utc>, GalleryError> {
        self.gallery
            .cache()
            .dates
            .get_or_try_insert_with(&self.rel, || {
                if self.is_directory() {
                    let mut newest = None;
                    for image in self.all_images_recursive()? {
                        let date = image.date()?;
                        newest = Some(newest.map_or(date, |n: DateTime<Utc>| n.max(date)));
                    }
                    if let Some(newest) = newest {
                        return Ok(newest);
                    }
                }
                self.modified()
            })
    }

    fn modified(&self) -> Result<DateTime<Utc>, GalleryError> {
        let modified = fs::metadata(self.full_path())?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// Pixel size read from the image header, `None` if unreadable.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.gallery
            .cache()
            .dimensions
            .get_or_insert_with(&self.rel, || {
                match self.gallery.backend().identify(&self.full_path()) {
                    Ok(dims) => Some(dims),
                    Err(e) => {
                        warn!(path = %self.rel, error = %e, "cannot read image dimensions");
                        None
                    }
                }
            })
    }

    /// Whether the image shown for this node is landscape.
    pub fn horizontal(&self) -> Result<bool, GalleryError> {
        Ok(self
            .representative_thumbnail()?
            .dimensions()
            .is_some_and(Dimensions::is_horizontal))
    }

    /// Output path of this node's page, relative to the site root.
    pub fn page_path(&self) -> RelPath {
        if self.is_directory() {
            self.rel.join("index.html")
        } else {
            self.rel.with_suffix(".html")
        }
    }

    /// URL of this node's page.
    pub fn page_url(&self) -> String {
        let base = &self.gallery.config().site.base_url;
        if self.is_root() {
            format!("{}/", base)
        } else if self.is_directory() {
            format!("{}/{}/", base, self.rel.url_encoded())
        } else {
            format!("{}/{}.html", base, self.rel.url_encoded())
        }
    }

    /// URL of the file itself, as copied into the site.
    pub fn file_url(&self) -> String {
        format!(
            "{}/{}",
            self.gallery.config().site.base_url,
            self.rel.url_encoded()
        )
    }

    /// Child named `index.*` whose content replaces a directory's listing page.
    pub fn index_child(&self) -> Result<Option<MediaNode>, GalleryError> {
        Ok(self.children()?.into_iter().find(|c| {
            c.rel.file_name() != "index"
                && Path::new(c.rel.file_name())
                    .file_stem()
                    .is_some_and(|stem| stem == "index")
        }))
    }
}
