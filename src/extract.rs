//! Foreground extraction and tight cropping
//!
//! Isolates the main object of a photo (document, card, print) from a dark
//! background and recolors the removed background to white:
//!
//! 1. Border classification gates the whole step: on light backgrounds the
//!    segmentation boundary is unreliable, so the input passes through.
//! 2. The working image is capped at a maximum dimension to bound the
//!    segmentation backend's memory use.
//! 3. The backend's alpha estimate is binarized, the largest 8-connected
//!    foreground region is selected, padded, cropped, and composited onto
//!    white.
//!
//! Every failure mode (no backend, backend error, no region, region too
//! small) falls back to returning the input unchanged; extraction is never
//! fatal.

use image::{imageops, imageops::FilterType, GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::background::{BackgroundClassifier, BackgroundOptions};
use crate::segment::SegmentationBackend;

// ============================================================
// Constants
// ============================================================

/// Longest working-image side handed to the segmentation backend
const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Alpha values at or below this count as background (0-255)
const DEFAULT_ALPHA_THRESHOLD: u8 = 10;

/// Minimum object area as a fraction of the working image area
const DEFAULT_MIN_AREA_RATIO: f32 = 0.05;

/// Padding around the object as a fraction of its longer side
const DEFAULT_PADDING_RATIO: f32 = 0.02;

/// Minimum padding in pixels
const DEFAULT_MIN_PADDING: u32 = 5;

// ============================================================
// Options
// ============================================================

/// Options for foreground extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Longest side of the image handed to the segmentation backend;
    /// larger inputs are downscaled first and the result rescaled
    pub max_dimension: u32,

    /// Alpha binarization cutoff (alpha > cutoff is foreground)
    pub alpha_threshold: u8,

    /// Regions smaller than this fraction of the image are ignored
    pub min_area_ratio: f32,

    /// Padding added around the object, as a fraction of its longer side
    pub padding_ratio: f32,

    /// Lower bound on the padding in pixels
    pub min_padding: u32,

    /// Background tone classification options
    pub background: BackgroundOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            min_area_ratio: DEFAULT_MIN_AREA_RATIO,
            padding_ratio: DEFAULT_PADDING_RATIO,
            min_padding: DEFAULT_MIN_PADDING,
            background: BackgroundOptions::default(),
        }
    }
}

// ============================================================
// Types
// ============================================================

/// A rectangle within an image's pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ObjectBounds {
    /// Expand by `pad` on every side, clamped to an `image_w` x `image_h`
    /// grid.
    pub fn padded(&self, pad: u32, image_w: u32, image_h: u32) -> ObjectBounds {
        let x1 = self.x.saturating_sub(pad);
        let y1 = self.y.saturating_sub(pad);
        let x2 = (self.x + self.width + pad).min(image_w);
        let y2 = (self.y + self.height + pad).min(image_h);
        ObjectBounds {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }
}

/// Largest connected foreground region of a mask
struct RegionStats {
    area: u64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl RegionStats {
    fn bounds(&self) -> ObjectBounds {
        ObjectBounds {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
        }
    }
}

// ============================================================
// Cropper
// ============================================================

/// Foreground extraction processor
pub struct ForegroundCropper {
    options: ExtractOptions,
    backend: Box<dyn SegmentationBackend>,
}

impl ForegroundCropper {
    /// Create a cropper around a segmentation backend.
    pub fn new(options: ExtractOptions, backend: Box<dyn SegmentationBackend>) -> Self {
        Self { options, backend }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Detect and crop the main object.
    ///
    /// Returns the input unchanged when the background is light, when the
    /// backend fails, or when no confident object is found. The output
    /// dimensions otherwise track the detected object plus padding.
    pub fn extract_main_object(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();

        if !BackgroundClassifier::is_dark(image, &self.options.background) {
            debug!("Light background, skipping extraction");
            return image.clone();
        }

        // Cap the working resolution to bound backend memory.
        let longest = width.max(height);
        let (working, scale) = if longest > self.options.max_dimension {
            let scale = self.options.max_dimension as f32 / longest as f32;
            let new_w = (width as f32 * scale) as u32;
            let new_h = (height as f32 * scale) as u32;
            debug!(
                from_w = width,
                from_h = height,
                to_w = new_w,
                to_h = new_h,
                "Downscaling for segmentation"
            );
            // Box sampling averages source regions, which keeps thin
            // foreground detail intact through a large shrink.
            (imageops::thumbnail(image, new_w, new_h), Some(scale))
        } else {
            (image.clone(), None)
        };

        let matted = match self.backend.segment(&working) {
            Ok(matted) => matted,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Segmentation failed, returning original image");
                return image.clone();
            }
        };

        let mask = alpha_mask(&matted, self.options.alpha_threshold);
        let region = match largest_region(&mask) {
            Some(region) => region,
            None => {
                debug!("No foreground region found, returning original image");
                return image.clone();
            }
        };

        let (work_w, work_h) = working.dimensions();
        let min_area = (work_w as u64 * work_h as u64) as f32 * self.options.min_area_ratio;
        if (region.area as f32) < min_area {
            debug!(
                area = region.area,
                min_area, "Object too small, returning original image"
            );
            return image.clone();
        }

        let bounds = region.bounds();
        let pad = self
            .options
            .min_padding
            .max((self.options.padding_ratio * bounds.width.max(bounds.height) as f32).round()
                as u32);
        let padded = bounds.padded(pad, work_w, work_h);

        let crop = imageops::crop_imm(&matted, padded.x, padded.y, padded.width, padded.height)
            .to_image();
        let composited = composite_on_white(&crop);

        // Rescale so the crop is proportional to what it would have been at
        // native resolution.
        match scale {
            Some(scale) => {
                let out_w = (padded.width as f32 / scale) as u32;
                let out_h = (padded.height as f32 / scale) as u32;
                imageops::resize(&composited, out_w.max(1), out_h.max(1), FilterType::Triangle)
            }
            None => composited,
        }
    }
}

// ============================================================
// Mask helpers
// ============================================================

/// Binarize the alpha channel of a matted image.
fn alpha_mask(matted: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = matted.dimensions();
    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in matted.enumerate_pixels() {
        let value = if pixel.0[3] > threshold { 255 } else { 0 };
        mask.put_pixel(x, y, Luma([value]));
    }
    mask
}

/// Find the largest 8-connected foreground region of a binary mask.
///
/// Component labeling counts filled pixels, so holes nested inside the
/// foreground neither split the region nor inflate its area.
fn largest_region(mask: &GrayImage) -> Option<RegionStats> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut stats: Vec<Option<RegionStats>> = Vec::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if stats.len() < label {
            stats.resize_with(label, || None);
        }
        match &mut stats[label - 1] {
            Some(s) => {
                s.area += 1;
                s.min_x = s.min_x.min(x);
                s.min_y = s.min_y.min(y);
                s.max_x = s.max_x.max(x);
                s.max_y = s.max_y.max(y);
            }
            slot => {
                *slot = Some(RegionStats {
                    area: 1,
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
        }
    }

    stats.into_iter().flatten().max_by_key(|s| s.area)
}

/// Blend a matted RGBA crop over an opaque white background.
fn composite_on_white(crop: &RgbaImage) -> RgbImage {
    let (width, height) = crop.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in crop.enumerate_pixels() {
        let alpha = pixel.0[3] as f32 / 255.0;
        let blend = |fg: u8| -> u8 { (fg as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8 };
        out.put_pixel(
            x,
            y,
            Rgb([blend(pixel.0[0]), blend(pixel.0[1]), blend(pixel.0[2])]),
        );
    }
    out
}

// ============================================================
// Tests
// ============================================================
