//! Segmentation oracle boundary
//!
//! The foreground cropper consumes a same-size RGBA estimate of the main
//! subject: the alpha channel is the foreground opacity (0 = background,
//! 255 = foreground). The backend producing that estimate is pluggable so
//! alternate models can be substituted without touching the cropper.
//!
//! Backend failures are recoverable by contract: callers fall back to the
//! unmodified input image.

mod rembg;

pub use rembg::RembgBackend;

use image::{RgbImage, RgbaImage};
use thiserror::Error;

/// Segmentation error types
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("Segmentation backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Segmentation command failed: {0}")]
    CommandFailed(String),

    #[error("Backend returned {got_w}x{got_h} for a {want_w}x{want_h} input")]
    SizeMismatch {
        want_w: u32,
        want_h: u32,
        got_w: u32,
        got_h: u32,
    },

    #[error("Invalid backend output: {0}")]
    InvalidOutput(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegmentError>;

/// A foreground segmentation backend.
///
/// Implementations must return an RGBA image with the same dimensions as
/// the input, where each pixel's alpha approximates foreground membership.
pub trait SegmentationBackend {
    /// Estimate the foreground of `image`.
    fn segment(&self, image: &RgbImage) -> Result<RgbaImage>;

    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Placeholder backend used when no real backend could be constructed.
///
/// Always fails with [`SegmentError::BackendUnavailable`], which callers
/// treat as the recoverable keep-the-original path.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SegmentationBackend for UnavailableBackend {
    fn segment(&self, _image: &RgbImage) -> Result<RgbaImage> {
        Err(SegmentError::BackendUnavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Backend returning a fixed RGBA image, for exercising the contract.
    struct FixedBackend {
        output: RgbaImage,
    }

    impl SegmentationBackend for FixedBackend {
        fn segment(&self, _image: &RgbImage) -> Result<RgbaImage> {
            Ok(self.output.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_trait_object_safety() {
        let backend: Box<dyn SegmentationBackend> = Box::new(FixedBackend {
            output: RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
        });
        assert_eq!(backend.name(), "fixed");

        let input = RgbImage::new(4, 4);
        let out = backend.segment(&input).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_error_display() {
        let err = SegmentError::SizeMismatch {
            want_w: 100,
            want_h: 50,
            got_w: 99,
            got_h: 50,
        };
        assert!(err.to_string().contains("99x50"));
        assert!(err.to_string().contains("100x50"));
    }
}
