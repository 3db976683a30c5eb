//! Page fitting and compositing
//!
//! Places a processed image on a fixed-size white page canvas. The image
//! is scaled by the smaller of the width-fit and height-fit ratios, so it
//! is fully contained, touches one axis, and is scaled up as well as down.

use image::{imageops, imageops::FilterType, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================
// Constants
// ============================================================

/// A4 page width in millimeters
const A4_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimeters
const A4_HEIGHT_MM: f32 = 297.0;

/// Default rendering resolution
const DEFAULT_DPI: u32 = 300;

/// Millimeters per inch
const MM_PER_INCH: f64 = 25.4;

// ============================================================
// PageSpec
// ============================================================

/// Physical page dimensions plus rendering resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSpec {
    /// Page width in millimeters
    pub width_mm: f32,

    /// Page height in millimeters
    pub height_mm: f32,

    /// Pixels per inch for the rasterized page
    pub dpi: u32,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4(DEFAULT_DPI)
    }
}

impl PageSpec {
    /// A4 portrait at the given resolution.
    pub fn a4(dpi: u32) -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            dpi,
        }
    }

    /// Pixel dimensions of the page canvas (truncating mm-to-px, never
    /// below 1x1). A4 at 300 dpi is 2480x3507.
    pub fn px_dimensions(&self) -> (u32, u32) {
        let px = |mm: f32| ((f64::from(mm) / MM_PER_INCH * f64::from(self.dpi)) as u32).max(1);
        (px(self.width_mm), px(self.height_mm))
    }
}

// ============================================================
// PageFitter
// ============================================================

/// Scales and centers images onto page canvases
pub struct PageFitter;

impl PageFitter {
    /// Place `image` on a white page canvas described by `spec`.
    ///
    /// The output always has exactly the canvas dimensions. Centering
    /// offsets are floored, so the image may sit one pixel off exact
    /// center.
    pub fn place_on_page(image: &RgbImage, spec: &PageSpec) -> RgbImage {
        let (page_w, page_h) = spec.px_dimensions();
        let (img_w, img_h) = image.dimensions();

        let ratio = (page_w as f64 / img_w as f64).min(page_h as f64 / img_h as f64);
        let new_w = ((img_w as f64 * ratio) as u32).max(1);
        let new_h = ((img_h as f64 * ratio) as u32).max(1);

        debug!(
            img_w,
            img_h, page_w, page_h, new_w, new_h, "Fitting image to page"
        );

        let resized = if (new_w, new_h) == (img_w, img_h) {
            image.clone()
        } else {
            imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
        };

        let mut canvas = RgbImage::from_pixel(page_w, page_h, Rgb([255, 255, 255]));
        let x_offset = ((page_w - new_w) / 2) as i64;
        let y_offset = ((page_h - new_h) / 2) as i64;
        imageops::overlay(&mut canvas, &resized, x_offset, y_offset);
        canvas
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_spec_default_is_a4_300() {
        let spec = PageSpec::default();
        assert_eq!(spec.width_mm, 210.0);
        assert_eq!(spec.height_mm, 297.0);
        assert_eq!(spec.dpi, 300);
    }

    #[test]
    fn test_a4_300_pixel_dimensions() {
        assert_eq!(PageSpec::a4(300).px_dimensions(), (2480, 3507));
    }

    #[test]
    fn test_px_dimensions_never_zero() {
        let spec = PageSpec {
            width_mm: 0.01,
            height_mm: 0.01,
            dpi: 1,
        };
        assert_eq!(spec.px_dimensions(), (1, 1));
    }

    fn small_spec() -> PageSpec {
        // 200x300 px canvas without heavy resampling cost.
        PageSpec {
            width_mm: 20.0,
            height_mm: 30.0,
            dpi: 254,
        }
    }

    #[test]
    fn test_small_spec_canvas() {
        assert_eq!(small_spec().px_dimensions(), (200, 300));
    }

    #[test]
    fn test_downscale_terminates_at_canvas_size() {
        let image = RgbImage::from_pixel(1000, 400, Rgb([0, 0, 0]));
        let page = PageFitter::place_on_page(&image, &small_spec());
        assert_eq!(page.dimensions(), (200, 300));
    }

    #[test]
    fn test_upscale_terminates_at_canvas_size() {
        let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let page = PageFitter::place_on_page(&image, &small_spec());
        assert_eq!(page.dimensions(), (200, 300));
    }

    #[test]
    fn test_width_limited_fit_is_centered_vertically() {
        // 100x50 on 200x300: ratio = min(2.0, 6.0) = 2.0 -> 200x100.
        let image = RgbImage::from_pixel(100, 50, Rgb([0, 0, 0]));
        let page = PageFitter::place_on_page(&image, &small_spec());

        assert_eq!(page.dimensions(), (200, 300));
        // Vertical band: white above y=100, black 100..200, white below.
        assert_eq!(*page.get_pixel(100, 50), Rgb([255, 255, 255]));
        assert_eq!(*page.get_pixel(100, 150), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(100, 250), Rgb([255, 255, 255]));
        // Touches both side edges.
        assert_eq!(*page.get_pixel(0, 150), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(199, 150), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_already_fit_image_is_idempotent() {
        // Canvas-sized input: ratio is exactly 1, no resampling happens,
        // so re-fitting is the identity.
        let mut image = RgbImage::from_pixel(200, 300, Rgb([200, 10, 10]));
        image.put_pixel(17, 23, Rgb([0, 0, 255]));
        let page = PageFitter::place_on_page(&image, &small_spec());
        assert_eq!(page, image);
    }

    #[test]
    fn test_height_limited_fit() {
        // 50x300 on 200x300: ratio = min(4.0, 1.0) = 1.0 -> pasted as-is,
        // centered horizontally at x = 75.
        let image = RgbImage::from_pixel(50, 300, Rgb([0, 0, 0]));
        let page = PageFitter::place_on_page(&image, &small_spec());
        assert_eq!(page.dimensions(), (200, 300));
        assert_eq!(*page.get_pixel(74, 150), Rgb([255, 255, 255]));
        assert_eq!(*page.get_pixel(75, 150), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(124, 150), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(125, 150), Rgb([255, 255, 255]));
    }
}
