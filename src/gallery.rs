//! The gallery handle: root directory, configuration, conversion backend and
//! the per-run caches every [`MediaNode`] shares.
//!
//! A [`Gallery`] is cheap to clone (one `Arc`). Nodes are value handles
//! (gallery + relative path), so any number of independently constructed,
//! equal nodes see the same cached derivations.
//!
//! ## Caches
//!
//! Derived properties (children, pairings, recursive image lists, dates,
//! dimensions, representatives) are memoized in [`NodeCache`], keyed by
//! [`RelPath`]. Entries store paths, never node handles, so the gallery owns
//! no reference cycles. An entry is written once: the first caller computes
//! the value outside the lock, and if another thread got there first its
//! value wins.

use crate::artifact::{self, ArtifactStore};
use crate::config::{self, ConfigError, SiteConfig};
use crate::imaging::{BackendError, Dimensions, ImageBackend, MagickBackend, badge};
use crate::naming::RelPath;
use crate::node::{MediaKind, MediaNode, RESIZED_DIR};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Image conversion failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Gallery root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Path escapes the gallery root: {0}")]
    OutsideRoot(String),
    #[error("{path} is a {found}, expected {expected}")]
    KindMismatch {
        path: RelPath,
        expected: &'static str,
        found: MediaKind,
    },
    #[error("No images anywhere beneath gallery directory: {0}")]
    EmptyGallery(RelPath),
    #[error("Video has no poster image: {0}")]
    MissingPoster(RelPath),
    #[error("Unknown page type: {0}")]
    UnknownPageType(RelPath),
}

const BUILTIN_BADGE: &str = ".play-badge.png";

/// Write-once memo table keyed by a hashable path.
pub(crate) struct Memo<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the cached value or compute and store it.
    ///
    /// `compute` runs without the lock held, so it may recurse into the same
    /// table for other keys. Errors are returned and not cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(value)
            .clone())
    }

    pub fn get_or_insert_with(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert_with(key, || Ok::<V, std::convert::Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Derivation caches shared by all nodes of one gallery.
#[derive(Default)]
pub(crate) struct NodeCache {
    pub kinds: Memo<RelPath, MediaKind>,
    pub children: Memo<RelPath, Vec<RelPath>>,
    pub paired_videos: Memo<RelPath, Option<RelPath>>,
    pub paired_images: Memo<RelPath, Option<RelPath>>,
    pub all_images: Memo<RelPath, Vec<RelPath>>,
    pub representatives: Memo<RelPath, RelPath>,
    pub dates: Memo<RelPath, DateTime<Utc>>,
    pub dimensions: Memo<RelPath, Option<Dimensions>>,
    pub overlay: Memo<(), PathBuf>,
}

struct GalleryInner {
    root: PathBuf,
    root_name: String,
    config: SiteConfig,
    backend: Arc<dyn ImageBackend>,
    cache: NodeCache,
    artifacts: ArtifactStore,
}

/// Shared handle to one gallery tree.
#[derive(Clone)]
pub struct Gallery {
    inner: Arc<GalleryInner>,
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl Gallery {
    /// Open a gallery with `config.toml` from its root and the ImageMagick backend.
    pub fn load(root: &Path) -> Result<Self, GalleryError> {
        let config = config::load_config(root)?;
        Self::open(root, config)
    }

    /// Open a gallery with the ImageMagick backend configured by `config.convert`.
    pub fn open(root: &Path, config: SiteConfig) -> Result<Self, GalleryError> {
        let backend = Arc::new(MagickBackend::from_config(&config.convert));
        Self::with_backend(root, config, backend)
    }

    pub fn with_backend(
        root: &Path,
        config: SiteConfig,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self, GalleryError> {
        let root = root
            .canonicalize()
            .map_err(|_| GalleryError::RootNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(GalleryError::RootNotFound(root));
        }
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            inner: Arc::new(GalleryInner {
                root,
                root_name,
                config,
                backend,
                cache: NodeCache::default(),
                artifacts: ArtifactStore::default(),
            }),
        })
    }

    /// Absolute, canonical gallery root.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Name of the root directory on disk.
    pub fn root_name(&self) -> &str {
        &self.inner.root_name
    }

    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &dyn ImageBackend {
        self.inner.backend.as_ref()
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.inner.artifacts
    }

    pub(crate) fn cache(&self) -> &NodeCache {
        &self.inner.cache
    }

    pub fn root_node(&self) -> MediaNode {
        MediaNode::new(self.clone(), RelPath::root())
    }

    /// Node for a path relative to the root. `..` segments are rejected.
    pub fn node(&self, relative: &str) -> Result<MediaNode, GalleryError> {
        let rel = RelPath::parse(relative)
            .ok_or_else(|| GalleryError::OutsideRoot(relative.to_string()))?;
        Ok(self.node_at(rel))
    }

    pub(crate) fn node_at(&self, rel: RelPath) -> MediaNode {
        MediaNode::new(self.clone(), rel)
    }

    /// Badge composited onto video thumbnails.
    ///
    /// A configured path is taken relative to the root. Without one, the
    /// built-in play badge is written once per run to
    /// `resized/.play-badge.png`.
    pub fn overlay_path(&self) -> Result<PathBuf, GalleryError> {
        if let Some(configured) = &self.config().convert.overlay {
            return Ok(self.root().join(configured));
        }
        self.cache().overlay.get_or_try_insert_with(&(), || {
            let path = self.root().join(RESIZED_DIR).join(BUILTIN_BADGE);
            artifact::write_atomically(&path, badge::write_play_badge)?;
            Ok(path)
        })
    }

    /// Whether two handles refer to the same root directory.
    pub fn same_root(&self, other: &Gallery) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.root == other.inner.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn memo_computes_once() {
        let memo: Memo<String, u32> = Memo::default();
        let calls = AtomicUsize::new(0);
        let key = "a".to_string();
        for _ in 0..3 {
            let v = memo.get_or_insert_with(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                7
            });
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn memo_does_not_cache_errors() {
        let memo: Memo<String, u32> = Memo::default();
        let key = "a".to_string();
        let first: Result<u32, &str> = memo.get_or_try_insert_with(&key, || Err("nope"));
        assert!(first.is_err());
        let second: Result<u32, &str> = memo.get_or_try_insert_with(&key, || Ok(3));
        assert_eq!(second, Ok(3));
    }

    #[test]
    fn memo_allows_recursion_into_other_keys() {
        let memo: Memo<u32, u32> = Memo::default();
        fn depth(memo: &Memo<u32, u32>, n: u32) -> u32 {
            memo.get_or_insert_with(&n, || if n == 0 { 0 } else { depth(memo, n - 1) + 1 })
        }
        assert_eq!(depth(&memo, 5), 5);
        assert_eq!(memo.len(), 6);
    }

    #[test]
    fn missing_root_is_error() {
        let result = Gallery::open(Path::new("/nonexistent/gallery/root"), SiteConfig::default());
        assert!(matches!(result, Err(GalleryError::RootNotFound(_))));
    }

    #[test]
    fn file_root_is_error() {
        let fixture = GalleryFixture::new();
        fixture.write_file("plain.txt", "x");
        let result = Gallery::open(&fixture.path().join("plain.txt"), SiteConfig::default());
        assert!(matches!(result, Err(GalleryError::RootNotFound(_))));
    }

    #[test]
    fn node_rejects_parent_segments() {
        let fixture = GalleryFixture::new();
        let (gallery, _) = fixture.open_mock();
        assert!(matches!(
            gallery.node("../outside.jpg"),
            Err(GalleryError::OutsideRoot(p)) if p == "../outside.jpg"
        ));
    }

    #[test]
    fn node_normalizes_path() {
        let fixture = GalleryFixture::new();
        let (gallery, _) = fixture.open_mock();
        assert_eq!(
            gallery.node("./sub//a.jpg").unwrap(),
            gallery.node("sub/a.jpg").unwrap()
        );
        assert!(gallery.node("").unwrap().is_root());
    }

    #[cfg(unix)]
    #[test]
    fn node_keeps_backslash_in_file_name() {
        let fixture = GalleryFixture::new();
        fixture.image("a\\b.jpg", 2, 2);
        let (gallery, _) = fixture.open_mock();
        let node = gallery.node("a\\b.jpg").unwrap();
        assert!(node.is_image());
        assert!(node.parent().unwrap().is_root());
    }

    #[test]
    fn load_reads_config_from_root() {
        let fixture = GalleryFixture::new();
        fixture.write_file("config.toml", "[site]\nbase_url = \"/g\"\n");
        let gallery = Gallery::load(fixture.path()).unwrap();
        assert_eq!(gallery.config().site.base_url, "/g");
    }

    #[test]
    fn load_surfaces_config_errors() {
        let fixture = GalleryFixture::new();
        fixture.write_file("config.toml", "[convert]\nquality = 0\n");
        assert!(matches!(
            Gallery::load(fixture.path()),
            Err(GalleryError::Config(_))
        ));
    }

    #[test]
    fn default_overlay_is_builtin_badge_under_resized() {
        let fixture = GalleryFixture::new();
        fixture.image("a.jpg", 2, 2);
        let (gallery, _) = fixture.open_mock();

        let path = gallery.overlay_path().unwrap();
        assert_eq!(path, gallery.root().join("resized/.play-badge.png"));
        assert_eq!(
            image::image_dimensions(&path).unwrap(),
            (badge::BADGE_SIZE, badge::BADGE_SIZE)
        );
        assert_eq!(gallery.overlay_path().unwrap(), path);
        assert_eq!(gallery.root_node().children().unwrap().len(), 1);
    }

    #[test]
    fn configured_overlay_is_relative_to_root() {
        let fixture = GalleryFixture::new();
        let mut config = SiteConfig::default();
        config.convert.overlay = Some("play.png".into());
        let (gallery, _) = fixture.open_mock_with(config);
        assert_eq!(gallery.overlay_path().unwrap(), gallery.root().join("play.png"));
        assert!(!gallery.root().join("resized").exists());
    }

    #[cfg(unix)]
    #[test]
    fn default_config_overlay_passes_convert_backend_checks() {
        use crate::imaging::{Quality, ThumbnailParams};

        let fixture = GalleryFixture::new();
        fixture.image("a.jpg", 2, 2);
        fixture.video("a.mp4");
        let mut config = SiteConfig::default();
        // accepts any arguments and succeeds
        config.convert.program = "true".into();
        let gallery = Gallery::open(fixture.path(), config).unwrap();

        let result = gallery.backend().thumbnail(&ThumbnailParams {
            source: gallery.node("a.jpg").unwrap().full_path(),
            output: fixture.path().join("thumb.jpg"),
            width: 200,
            height: 200,
            quality: Quality::default(),
            overlay: Some(gallery.overlay_path().unwrap()),
        });
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn root_name_is_directory_name() {
        let fixture = GalleryFixture::new();
        fixture.mkdir("Holiday");
        let (gallery, _) = fixture.open_mock_at("Holiday");
        assert_eq!(gallery.root_name(), "Holiday");
    }
}
