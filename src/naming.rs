//! Centralized path and filename handling for gallery entries.
//!
//! Every node in the gallery is addressed by a [`RelPath`]: a `/`-separated
//! path relative to the gallery root. The root itself is the empty path.
//! Normalization happens once, at construction, so two spellings of the same
//! entry (`./a/b.jpg`, `a//b.jpg`, `/a/b.jpg`) compare and hash equal.
//!
//! ## Name parts
//!
//! - `sub/a.b.jpg` → file name `a.b.jpg`, extension `jpg`, stem path `sub/a.b`
//! - `sub/movie` → file name `movie`, no extension, stem path `sub/movie`
//! - `` (root) → file name ``, parent `None`

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A normalized path relative to the gallery root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelPath(String);

impl RelPath {
    /// The gallery root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a relative path.
    ///
    /// Leading slashes, empty segments and `.` segments are dropped.
    /// Returns `None` if any segment is `..`, since the result would
    /// escape the gallery root.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                s => segments.push(s),
            }
        }
        Some(Self(segments.join("/")))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one entry name. The name must not contain a separator.
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Containing directory; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(pos) => Some(Self(self.0[..pos].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Last path segment. Empty for the root.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// Extension of the last segment, without the dot.
    ///
    /// Dotfile-style names (`.hidden`) have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }

    /// The path with the extension of the last segment removed.
    pub fn stem_path(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.0[..self.0.len() - ext.len() - 1],
            None => &self.0,
        }
    }

    /// Same path, different extension on the last segment.
    pub fn with_extension(&self, ext: &str) -> Self {
        Self(format!("{}.{}", self.stem_path(), ext))
    }

    /// Same path with `suffix` appended to the last segment.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }

    /// Resolve against a gallery root on disk.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            return root.to_path_buf();
        }
        self.0.split('/').fold(root.to_path_buf(), |p, s| p.join(s))
    }

    /// Percent-encode each segment for use in a URL path.
    pub fn url_encoded(&self) -> String {
        self.0
            .split('/')
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}
