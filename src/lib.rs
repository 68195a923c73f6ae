//! # Media Gal
//!
//! Builds a browsable gallery out of a directory of photos and videos. The
//! directory tree is the data source: directories become galleries, images
//! and videos become media pages, and derived thumbnails and previews are
//! written next to their sources under `resized/`.
//!
//! # Architecture: Lazy Node Tree
//!
//! There is no manifest and no separate scan stage. A [`gallery::Gallery`]
//! hands out [`node::MediaNode`] value handles, and every property a page
//! needs (kind, children, pairing, date, dimensions, representative image)
//! is derived from the filesystem on first use and memoized for the run.
//!
//! ```text
//! Gallery ─▶ MediaNode ─▶ PageView        (page data per node)
//!               │
//!               └──────▶ ArtifactStore   (thumbnails and previews on demand)
//!
//! site::build = static_files ─▶ copy ─▶ pages
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Gallery handle: root, config, backend, shared derivation caches |
//! | [`node`] | `MediaNode`: classification, listings, video/poster pairing, navigation |
//! | [`artifact`] | Artifact identity, on-disk location and single-flight generation |
//! | [`page`] | `PageView`: the data a template receives, in full or shallow form |
//! | [`site`] | Page list, static file list, copying and the whole build |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`naming`] | `RelPath`: normalized root-relative paths and URL encoding |
//! | [`imaging`] | Conversion backend trait and the ImageMagick implementation |
//! | [`output`] | CLI output formatting for `scan` and `build` |
//!
//! # Design Decisions
//!
//! ## Videos Are Shown Through Their Poster
//!
//! A video is displayable only when an image with the same base name sits
//! next to it. The image supplies the thumbnail and preview, and is itself
//! hidden from listings so each pair shows up once.
//!
//! ## Artifacts Live Next To Their Sources
//!
//! Derived files go to `<dir>/resized/<op>_<box>_<name>.jpg`. A later run
//! finds them there and skips the conversion unless `--force` is given. The
//! `resized` directories are never listed as galleries.
//!
//! ## External Converter
//!
//! Conversions shell out to ImageMagick `convert` through the
//! [`imaging::ImageBackend`] trait. Tests swap in a recording mock, so the
//! tree logic is exercised without the tool installed.

pub mod artifact;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod naming;
pub mod node;
pub mod output;
pub mod page;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
