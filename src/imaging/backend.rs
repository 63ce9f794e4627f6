//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the pipeline
//! needs: decode, resample, and encode. Everything else (region selection,
//! letterboxing, the size budget loop) lives in
//! [`operations`](super::operations) and [`compress`](super::compress) and
//! only talks to pixels through this trait.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::format::ImageMime;
use super::params::{Quality, Sharpening};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded source raster and the mime type it was decoded from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    pub mime: ImageMime,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage, mime: ImageMime) -> Self {
        Self { pixels, mime }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers in a batch.
pub trait ImageBackend: Sync {
    /// Decode an in-memory JPEG, PNG or WebP file.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Resize to exactly `width`x`height`, then apply the unsharp mask if given.
    fn resample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        sharpening: Option<Sharpening>,
    ) -> DynamicImage;

    /// Serialize `image` as `mime`. Quality is ignored by lossless formats.
    fn encode(
        &self,
        image: &DynamicImage,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A backend that delegates to [`RustBackend`] but records every call and
    /// can be told to fail encodes after a number of successes.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct RecordingBackend {
        inner: RustBackend,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Encodes allowed before every further encode fails. `None` = never fail.
        fail_encodes_after: Option<usize>,
        encodes: AtomicUsize,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode,
        Resample {
            width: u32,
            height: u32,
            sharpened: bool,
        },
        Encode {
            mime: ImageMime,
            quality: u32,
        },
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_encodes_after(successes: usize) -> Self {
            Self {
                fail_encodes_after: Some(successes),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Encode { .. }))
                .count()
        }
    }

    impl ImageBackend for RecordingBackend {
        fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode);
            self.inner.decode(bytes)
        }

        fn resample(
            &self,
            image: &DynamicImage,
            width: u32,
            height: u32,
            sharpening: Option<Sharpening>,
        ) -> DynamicImage {
            self.operations.lock().unwrap().push(RecordedOp::Resample {
                width,
                height,
                sharpened: sharpening.is_some(),
            });
            self.inner.resample(image, width, height, sharpening)
        }

        fn encode(
            &self,
            image: &DynamicImage,
            mime: ImageMime,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                mime,
                quality: quality.value(),
            });
            let n = self.encodes.fetch_add(1, Ordering::SeqCst);
            if self.fail_encodes_after.is_some_and(|limit| n >= limit) {
                return Err(BackendError::Encode("injected failure".into()));
            }
            self.inner.encode(image, mime, quality)
        }
    }

    #[test]
    fn recording_backend_records_resample() {
        let backend = RecordingBackend::new();
        let img = DynamicImage::new_rgb8(40, 30);
        let out = backend.resample(&img, 20, 15, Sharpening::from_slider(50));

        assert_eq!((out.width(), out.height()), (20, 15));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resample {
                width: 20,
                height: 15,
                sharpened: true
            }]
        );
    }

    #[test]
    fn recording_backend_fails_after_limit() {
        let backend = RecordingBackend::failing_encodes_after(1);
        let img = DynamicImage::new_rgb8(8, 8);

        assert!(backend.encode(&img, ImageMime::Png, Quality::default()).is_ok());
        let err = backend
            .encode(&img, ImageMime::Png, Quality::default())
            .unwrap_err();
        assert!(matches!(err, BackendError::Encode(_)));
        assert_eq!(backend.encode_count(), 2);
    }

    #[test]
    fn source_image_reports_dimensions() {
        let src = SourceImage::new(DynamicImage::new_rgba8(7, 3), ImageMime::Png);
        assert_eq!(src.dimensions(), (7, 3));
    }
}
