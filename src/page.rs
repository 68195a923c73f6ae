//! Page metadata for the rendering layer.
//!
//! Every directory and displayable media node gets a page. [`PageView`] is
//! the data a template receives for it:
//!
//! ```text
//! title               base file name (root: site.title or directory name)
//! date                modification time, newest image for directories
//! url                 page URL
//! horizontal          displayed image is wider than tall
//! thumbnail_url       square thumbnail of the representative image
//! media               displayable media children          (full, directories)
//! galleries           subdirectories, newest first        (full, directories)
//! parents             breadcrumbs below the root          (full)
//! prev / next         media siblings                      (full, media)
//! object_url          image: preview variant, video: the video file
//! fullsize_image_url  image: original file, video: poster's preview variant
//! ```
//!
//! # View Modes
//!
//! A page references other pages (children, parents, siblings) only through
//! [`ViewMode::Shallow`] views, which carry the summary fields and nothing
//! that would recurse. Building any full view therefore touches at most one
//! level of neighbors, whatever the depth of the tree.

use crate::gallery::GalleryError;
use crate::node::{MediaKind, MediaNode};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How much of a page to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The page being emitted.
    Full,
    /// A summary referenced from another page.
    Shallow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub date: DateTime<Utc>,
    pub url: String,
    pub horizontal: bool,
    pub thumbnail_url: String,
    pub media: Vec<PageView>,
    pub galleries: Vec<PageView>,
    pub parents: Vec<PageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Box<PageView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<PageView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullsize_image_url: Option<String>,
}

impl PageView {
    pub fn build(node: &MediaNode, mode: ViewMode) -> Result<Self, GalleryError> {
        let kind = node.classify();
        if !matches!(
            kind,
            MediaKind::Directory | MediaKind::Image | MediaKind::Video
        ) {
            return Err(GalleryError::UnknownPageType(node.relative_path().clone()));
        }

        let config = node.gallery().config();
        let representative = node.representative_thumbnail()?;
        let thumbnail = representative.request_thumbnail(config.thumbnails.size, false)?;

        let mut view = PageView {
            title: title(node),
            date: node.date()?,
            url: node.page_url(),
            horizontal: node.horizontal()?,
            thumbnail_url: thumbnail.file_url(),
            media: Vec::new(),
            galleries: Vec::new(),
            parents: Vec::new(),
            prev: None,
            next: None,
            object_url: None,
            fullsize_image_url: None,
        };
        if mode == ViewMode::Shallow {
            return Ok(view);
        }

        view.parents = breadcrumbs(node)?;
        let (preview_w, preview_h) = (config.previews.width, config.previews.height);
        match kind {
            MediaKind::Directory => {
                view.media = shallow_all(&node.media()?)?;
                view.galleries = shallow_all(&node.directories()?)?;
                // stable: equal dates keep child order
                view.galleries.sort_by(|a, b| b.date.cmp(&a.date));
            }
            MediaKind::Image => {
                let preview = node.request_variant(preview_w, preview_h, false)?;
                view.object_url = Some(preview.file_url());
                view.fullsize_image_url = Some(node.file_url());
                view.prev = shallow_neighbor(node.media_prev()?)?;
                view.next = shallow_neighbor(node.media_next()?)?;
            }
            MediaKind::Video => {
                // poster exists: checked by representative_thumbnail above
                let preview = representative.request_variant(preview_w, preview_h, false)?;
                view.object_url = Some(node.file_url());
                view.fullsize_image_url = Some(preview.file_url());
                view.prev = shallow_neighbor(node.media_prev()?)?;
                view.next = shallow_neighbor(node.media_next()?)?;
            }
            MediaKind::Missing | MediaKind::Other => {}
        }
        Ok(view)
    }

    pub fn shallow(node: &MediaNode) -> Result<Self, GalleryError> {
        Self::build(node, ViewMode::Shallow)
    }

    pub fn full(node: &MediaNode) -> Result<Self, GalleryError> {
        Self::build(node, ViewMode::Full)
    }
}

fn title(node: &MediaNode) -> String {
    let configured = &node.gallery().config().site.title;
    if node.is_root() && !configured.is_empty() {
        configured.clone()
    } else {
        node.base_name().to_string()
    }
}

/// Ancestors below the root, root-most first.
fn breadcrumbs(node: &MediaNode) -> Result<Vec<PageView>, GalleryError> {
    let mut parents = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.is_root() {
            break;
        }
        parents.push(PageView::shallow(&parent)?);
        current = parent.parent();
    }
    parents.reverse();
    Ok(parents)
}

fn shallow_all(nodes: &[MediaNode]) -> Result<Vec<PageView>, GalleryError> {
    nodes.iter().map(PageView::shallow).collect()
}

fn shallow_neighbor(node: Option<MediaNode>) -> Result<Option<Box<PageView>>, GalleryError> {
    node.map(|n| PageView::shallow(&n).map(Box::new)).transpose()
}
