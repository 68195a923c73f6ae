//! Shared test utilities for the media-gal test suite.
//!
//! Provides a throwaway gallery directory with real (tiny) image files,
//! constructors that open it against the recording mock backend, and lookup
//! helpers over page lists.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = GalleryFixture::new();
//! fx.image("Travel/dawn.jpg", 40, 30);
//! fx.video("Travel/dawn.mp4");
//!
//! let (gallery, backend) = fx.open_mock();
//! let pages = crate::site::pages(&gallery.root_node()).unwrap();
//! let travel = find_page(&pages, "Travel/index.html");
//! assert_eq!(view_titles(&travel.view.media), vec!["dawn.mp4"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::gallery::Gallery;
use crate::imaging::backend::tests::MockBackend;
use crate::page::PageView;
use crate::site::Page;

// =========================================================================
// Fixture setup
// =========================================================================

/// A gallery root in a temp directory, removed on drop.
pub struct GalleryFixture {
    dir: TempDir,
}

impl GalleryFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn prepare(&self, rel: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        path
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path().join(rel)).unwrap();
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.prepare(rel);
        fs::write(path, content).unwrap();
    }

    /// Write a real, decodable image. The format follows the extension.
    pub fn image(&self, rel: &str, width: u32, height: u32) {
        let path = self.prepare(rel);
        let format = match Path::new(rel)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("png") => image::ImageFormat::Png,
            _ => image::ImageFormat::Jpeg,
        };
        image::RgbImage::new(width, height)
            .save_with_format(path, format)
            .unwrap();
    }

    /// Videos are never decoded, so any bytes will do.
    pub fn video(&self, rel: &str) {
        let path = self.prepare(rel);
        fs::write(path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    }

    /// Set a file's modification time to `secs` after the epoch.
    pub fn set_mtime(&self, rel: &str, secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(self.path().join(rel))
            .unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    pub fn open_mock(&self) -> (Gallery, Arc<MockBackend>) {
        self.open_mock_with(SiteConfig::default())
    }

    pub fn open_mock_with(&self, config: SiteConfig) -> (Gallery, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let gallery = Gallery::with_backend(self.path(), config, backend.clone()).unwrap();
        (gallery, backend)
    }

    /// Gallery rooted at a subdirectory of the fixture.
    pub fn open_mock_at(&self, rel: &str) -> (Gallery, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let gallery =
            Gallery::with_backend(&self.path().join(rel), SiteConfig::default(), backend.clone())
                .unwrap();
        (gallery, backend)
    }

    /// Gallery whose every conversion fails with `message`.
    pub fn open_failing(&self, message: &str) -> (Gallery, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::failing(message));
        let gallery =
            Gallery::with_backend(self.path(), SiteConfig::default(), backend.clone()).unwrap();
        (gallery, backend)
    }
}

// =========================================================================
// Page lookups: panic with a clear message on miss
// =========================================================================

/// Find a page by output path. Panics if not found.
pub fn find_page<'a>(pages: &'a [Page], path: &str) -> &'a Page {
    pages
        .iter()
        .find(|p| p.path.as_str() == path)
        .unwrap_or_else(|| {
            let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();
            panic!("page '{path}' not found. Available: {paths:?}")
        })
}

/// Titles of a listing, in order.
pub fn view_titles(views: &[PageView]) -> Vec<&str> {
    views.iter().map(|v| v.title.as_str()).collect()
}

/// Output paths of all pages, in emission order.
pub fn page_paths(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|p| p.path.as_str()).collect()
}
