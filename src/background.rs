//! Background tone classification
//!
//! Decides whether an image's border region is dark or light by sampling
//! fixed-width strips along all four edges and averaging their luminance.
//! Cropping via segmentation is only useful when the true background is
//! visually distinct from a light document page, so callers skip the
//! segmentation step entirely on light backgrounds.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

// ============================================================
// Constants
// ============================================================

/// Maximum border strip thickness in pixels
const DEFAULT_BORDER_MAX_PX: u32 = 50;

/// Border strip thickness as a fraction of the image dimension (1/N)
const DEFAULT_BORDER_DIVISOR: u32 = 10;

/// Mean border luminance below which the background counts as dark (0-255)
const DEFAULT_DARK_THRESHOLD: f32 = 128.0;

// ============================================================
// Options
// ============================================================

/// Options for background tone classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Maximum border strip thickness in pixels
    pub border_max_px: u32,

    /// Strip thickness is at most width/divisor and height/divisor
    pub border_divisor: u32,

    /// Mean luminance cutoff; below this the background is dark (0-255)
    pub dark_threshold: f32,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            border_max_px: DEFAULT_BORDER_MAX_PX,
            border_divisor: DEFAULT_BORDER_DIVISOR,
            dark_threshold: DEFAULT_DARK_THRESHOLD,
        }
    }
}

// ============================================================
// Classifier
// ============================================================

/// Border-strip background classifier
pub struct BackgroundClassifier;

impl BackgroundClassifier {
    /// Returns true if the image border region is predominantly dark.
    ///
    /// The strip thickness is `min(border_max_px, w/divisor, h/divisor)`.
    /// Corner pixels fall in two strips and are counted twice; the bias is
    /// tiny and the overlap keeps the sampling uniform per edge. Images too
    /// small to carry a border strip (thickness 0) classify as light, so
    /// they pass through untouched downstream.
    pub fn is_dark(image: &RgbImage, options: &BackgroundOptions) -> bool {
        match Self::border_mean_luminance(image, options) {
            Some(mean) => mean < options.dark_threshold,
            None => false,
        }
    }

    /// Mean BT.601 luminance over the four border strips, or `None` when
    /// the strip thickness degenerates to zero.
    pub fn border_mean_luminance(image: &RgbImage, options: &BackgroundOptions) -> Option<f32> {
        let (width, height) = image.dimensions();
        let divisor = options.border_divisor.max(1);
        let thickness = options
            .border_max_px
            .min(width / divisor)
            .min(height / divisor);

        if thickness == 0 {
            return None;
        }

        let mut sum = 0.0f64;
        let mut count = 0u64;

        // Top and bottom strips span the full width.
        for y in (0..thickness).chain(height - thickness..height) {
            for x in 0..width {
                sum += Self::pixel_luminance(image.get_pixel(x, y)) as f64;
                count += 1;
            }
        }

        // Left and right strips span the full height (corners re-counted).
        for x in (0..thickness).chain(width - thickness..width) {
            for y in 0..height {
                sum += Self::pixel_luminance(image.get_pixel(x, y)) as f64;
                count += 1;
            }
        }

        Some((sum / count as f64) as f32)
    }

    /// ITU-R BT.601 luminance (0-255)
    pub(crate) fn pixel_luminance(pixel: &Rgb<u8>) -> f32 {
        let (r, g, b) = (pixel.0[0] as f32, pixel.0[1] as f32, pixel.0[2] as f32);
        0.299 * r + 0.587 * g + 0.114 * b
    }
}

// ============================================================
// Tests
// ============================================================
