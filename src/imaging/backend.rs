//! Conversion backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the gallery needs
//! from an image tool: identify, thumbnail, and resize.
//!
//! The production implementation is
//! [`MagickBackend`](super::magick::MagickBackend), which shells out to
//! ImageMagick with a fixed argument recipe per operation.

use super::params::{ResizeParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Conversion tool not found: {0}")]
    ToolNotFound(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_horizontal(self) -> bool {
        self.width > self.height
    }
}

/// Trait for conversion backends.
///
/// Implementations write the result to `params.output` and must fail if the
/// tool cannot produce it. Callers own destination naming, existence checks
/// and atomic placement.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce an exact-size, center-cropped thumbnail.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Produce a fit-within variant that is never upscaled.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations and writes a placeholder file
    /// at the requested output, so on-disk existence checks behave as with
    /// the real tool.
    ///
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Mutex<HashMap<String, Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_with: Mutex<Option<String>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
        Thumbnail {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
            overlay: Option<String>,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every conversion fail with `message`.
        pub fn failing(message: &str) -> Self {
            let backend = Self::default();
            *backend.fail_with.lock().unwrap() = Some(message.to_string());
            backend
        }

        /// Report `dims` for any file named `file_name`.
        pub fn set_dimensions(&self, file_name: &str, dims: Dimensions) {
            self.dimensions
                .lock()
                .unwrap()
                .insert(file_name.to_string(), dims);
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn conversions(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| !matches!(op, RecordedOp::Identify(_)))
                .collect()
        }

        fn produce(&self, output: &Path) -> Result<(), BackendError> {
            if let Some(message) = self.fail_with.lock().unwrap().clone() {
                return Err(BackendError::ProcessingFailed(message));
            }
            std::fs::write(output, b"derived")?;
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(self
                .dimensions
                .lock()
                .unwrap()
                .get(&name)
                .copied()
                .unwrap_or(Dimensions {
                    width: 400,
                    height: 300,
                }))
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                overlay: params
                    .overlay
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
            });
            self.produce(&params.output)
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            self.produce(&params.output)
        }
    }

    #[test]
    fn mock_identify_defaults_to_landscape() {
        let backend = MockBackend::new();
        let dims = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert!(dims.is_horizontal());

        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_uses_configured_dimensions() {
        let backend = MockBackend::new();
        backend.set_dimensions(
            "tall.jpg",
            Dimensions {
                width: 300,
                height: 500,
            },
        );
        let dims = backend.identify(Path::new("/x/tall.jpg")).unwrap();
        assert!(!dims.is_horizontal());
    }

    #[test]
    fn mock_records_thumbnail_and_writes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("thumb.jpg");
        let backend = MockBackend::new();

        backend
            .thumbnail(&ThumbnailParams {
                source: "/source.jpg".into(),
                output: output.clone(),
                width: 200,
                height: 200,
                quality: Quality::new(80),
                overlay: Some("/overlay.png".into()),
            })
            .unwrap();

        assert!(output.exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Thumbnail {
                width: 200,
                height: 200,
                quality: 80,
                overlay: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn failing_mock_reports_processing_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::failing("boom");
        let result = backend.resize(&ResizeParams {
            source: "/source.jpg".into(),
            output: tmp.path().join("out.jpg"),
            width: 10,
            height: 10,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(m)) if m == "boom"));
    }

    #[test]
    fn square_is_not_horizontal() {
        assert!(
            !Dimensions {
                width: 10,
                height: 10
            }
            .is_horizontal()
        );
    }
}
