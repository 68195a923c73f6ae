//! Derived artifacts: thumbnails and resized variants.
//!
//! An artifact is identified by its source image, the operation and the
//! requested box. The identity maps 1:1 onto a file next to the source:
//!
//! ```text
//! Travel/dawn.jpg  ──thumbnail 200──▶  Travel/resized/thumbnail_200_dawn.jpg.jpg
//!                  ──variant 1280x720─▶ Travel/resized/variant_1280x720_dawn.jpg.jpg
//! ```
//!
//! Square boxes use a single number (`200`), others `WxH`.
//!
//! # Generation
//!
//! [`ArtifactStore::ensure`] is the only place a conversion runs. Per key:
//!
//! 1. Without `force`, a key already handled in this run is reused and an
//!    existing destination file is kept as is.
//! 2. Otherwise the conversion writes to a hidden temp file in `resized/`
//!    which is then renamed over the destination. Readers never see a
//!    partial file, and a failed conversion leaves the old file untouched.
//!
//! Each key has its own lock, so concurrent requests for the same artifact
//! run the conversion once; requests for different artifacts proceed in
//! parallel.
//!
//! # Statistics
//!
//! [`ArtifactStats`] counts distinct artifacts, each by how its first
//! request in the run was satisfied. Later requests for the same key
//! (reuse, or a forced regeneration) do not change the counts.

use crate::imaging::BackendError;
use crate::naming::RelPath;
use crate::node::RESIZED_DIR;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Conversion recipe of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactOp {
    Thumbnail,
    Variant,
}

impl ArtifactOp {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactOp::Thumbnail => "thumbnail",
            ArtifactOp::Variant => "variant",
        }
    }
}

/// Identity of one derived file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub source: RelPath,
    pub op: ArtifactOp,
    pub width: u32,
    pub height: u32,
}

impl ArtifactKey {
    pub fn thumbnail(source: RelPath, size: u32) -> Self {
        Self {
            source,
            op: ArtifactOp::Thumbnail,
            width: size,
            height: size,
        }
    }

    pub fn variant(source: RelPath, width: u32, height: u32) -> Self {
        Self {
            source,
            op: ArtifactOp::Variant,
            width,
            height,
        }
    }

    /// `<op>_<dims>_<source file name>.jpg`
    pub fn file_name(&self) -> String {
        let dims = if self.width == self.height {
            self.width.to_string()
        } else {
            format!("{}x{}", self.width, self.height)
        };
        format!(
            "{}_{}_{}.jpg",
            self.op.prefix(),
            dims,
            self.source.file_name()
        )
    }

    /// Destination relative to the gallery root.
    pub fn destination(&self) -> RelPath {
        self.source
            .parent()
            .unwrap_or_else(RelPath::root)
            .join(RESIZED_DIR)
            .join(&self.file_name())
    }
}

/// How a request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// The conversion ran.
    Generated,
    /// The destination existed before this run asked for it.
    OnDisk,
    /// Already handled earlier in this run.
    Reused,
}

/// Distinct artifacts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactStats {
    pub generated: u32,
    pub on_disk: u32,
}

impl ArtifactStats {
    fn record(&mut self, status: ArtifactStatus) {
        match status {
            ArtifactStatus::Generated => self.generated += 1,
            ArtifactStatus::OnDisk => self.on_disk += 1,
            ArtifactStatus::Reused => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.generated + self.on_disk
    }
}

impl fmt::Display for ArtifactStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on_disk > 0 {
            write!(
                f,
                "{} generated, {} on disk ({} total)",
                self.generated,
                self.on_disk,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.generated)
        }
    }
}

type Slot = Arc<Mutex<Option<ArtifactStatus>>>;

/// Single-flight guard around artifact generation.
#[derive(Default)]
pub struct ArtifactStore {
    slots: Mutex<HashMap<ArtifactKey, Slot>>,
    stats: Mutex<ArtifactStats>,
}

impl ArtifactStore {
    fn slot(&self, key: &ArtifactKey) -> Slot {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Make sure `destination` holds the artifact for `key`.
    ///
    /// `generate` receives the temp path it must write to.
    pub fn ensure(
        &self,
        key: &ArtifactKey,
        destination: &Path,
        force: bool,
        generate: impl FnOnce(&Path) -> Result<(), BackendError>,
    ) -> Result<ArtifactStatus, BackendError> {
        let slot = self.slot(key);
        let mut handled = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let first = handled.is_none();
        let status = if !force && !first {
            ArtifactStatus::Reused
        } else if !force && destination.exists() {
            ArtifactStatus::OnDisk
        } else {
            write_atomically(destination, generate)?;
            ArtifactStatus::Generated
        };
        if first {
            *handled = Some(status);
            self.stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(status);
        }
        Ok(status)
    }

    pub fn stats(&self) -> ArtifactStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn temp_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // keep a .jpg suffix: the tool picks the encoder from it
    destination.with_file_name(format!(".{}.{}.partial.jpg", name, std::process::id()))
}

pub(crate) fn write_atomically(
    destination: &Path,
    generate: impl FnOnce(&Path) -> Result<(), BackendError>,
) -> Result<(), BackendError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_path(destination);
    if let Err(e) = generate(&temp) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp, destination) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
