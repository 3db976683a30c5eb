//! Scan enhancement filter chain
//!
//! Gives a photographed page the flat, high-contrast look of a photocopy:
//!
//! 1. Grayscale conversion (ITU-R BT.601)
//! 2. Illumination flattening: divide by a heavily median-blurred copy of
//!    the image, rescaled to full brightness; removes shadows and
//!    vignetting while preserving edge contrast
//! 3. Non-local-means denoising ([`denoise`]) to remove sensor grain
//!    without blurring text strokes
//! 4. Light Gaussian smoothing
//! 5. Gaussian-weighted adaptive binarization
//! 6. Morphological opening (isolated specks) then closing (thinned
//!    strokes)
//!
//! The result is strictly two-valued. A color variant passes pixels
//! through untouched for users who want a "color scan".

pub mod denoise;

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, median_filter, separable_filter_equal};
use imageproc::morphology::{close, open};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::background::BackgroundClassifier;

// ============================================================
// Constants
// ============================================================

/// Median filter radius for background estimation (21x21 window)
const DEFAULT_MEDIAN_RADIUS: u32 = 10;

/// Non-local-means filtering strength
const DEFAULT_DENOISE_STRENGTH: f32 = 15.0;

/// Non-local-means patch radius (7x7 template)
const DEFAULT_DENOISE_PATCH_RADIUS: u32 = 3;

/// Non-local-means search radius (21x21 window)
const DEFAULT_DENOISE_SEARCH_RADIUS: u32 = 10;

/// Gaussian smoothing kernel size (odd)
const DEFAULT_SMOOTHING_KERNEL: u32 = 5;

/// Adaptive threshold neighborhood size (odd)
const DEFAULT_ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Adaptive threshold offset constant
const DEFAULT_ADAPTIVE_C: f32 = 2.0;

/// Morphological element half-width (k=1 is a 3x3 square)
const DEFAULT_MORPH_K: u8 = 1;

// ============================================================
// Options
// ============================================================

/// Options for the monochrome scan chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Median filter radius used to estimate the page background
    pub median_radius: u32,

    /// Denoiser filtering strength (higher removes more grain)
    pub denoise_strength: f32,

    /// Denoiser patch radius in pixels
    pub denoise_patch_radius: u32,

    /// Denoiser search window radius in pixels
    pub denoise_search_radius: u32,

    /// Gaussian smoothing kernel size (odd)
    pub smoothing_kernel: u32,

    /// Adaptive threshold neighborhood size (odd)
    pub adaptive_block_size: u32,

    /// Constant subtracted from the local mean before thresholding
    pub adaptive_c: f32,

    /// Morphological element half-width for open/close
    pub morph_k: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            median_radius: DEFAULT_MEDIAN_RADIUS,
            denoise_strength: DEFAULT_DENOISE_STRENGTH,
            denoise_patch_radius: DEFAULT_DENOISE_PATCH_RADIUS,
            denoise_search_radius: DEFAULT_DENOISE_SEARCH_RADIUS,
            smoothing_kernel: DEFAULT_SMOOTHING_KERNEL,
            adaptive_block_size: DEFAULT_ADAPTIVE_BLOCK_SIZE,
            adaptive_c: DEFAULT_ADAPTIVE_C,
            morph_k: DEFAULT_MORPH_K,
        }
    }
}

// ============================================================
// Enhancer
// ============================================================

/// Scan enhancement processor
pub struct ScanEnhancer;

impl ScanEnhancer {
    /// Run the full black-and-white scan chain.
    pub fn scan_monochrome(image: &RgbImage, options: &ScanOptions) -> GrayImage {
        let gray = Self::to_grayscale(image);
        let flattened = Self::flatten_illumination(&gray, options.median_radius);

        debug!(
            strength = options.denoise_strength,
            patch = options.denoise_patch_radius,
            search = options.denoise_search_radius,
            "Denoising"
        );
        let denoised = denoise::nl_means(
            &flattened,
            options.denoise_strength,
            options.denoise_patch_radius,
            options.denoise_search_radius,
        );

        let blurred = gaussian_blur_f32(&denoised, sigma_for_kernel(options.smoothing_kernel));
        let binary = Self::adaptive_threshold(
            &blurred,
            options.adaptive_block_size,
            options.adaptive_c,
        );

        let opened = open(&binary, Norm::LInf, options.morph_k);
        close(&opened, Norm::LInf, options.morph_k)
    }

    /// Color pass-through variant: no tonal change, pixels stay as decoded.
    pub fn scan_color(image: &RgbImage) -> RgbImage {
        image.clone()
    }

    /// ITU-R BT.601 grayscale conversion.
    pub fn to_grayscale(image: &RgbImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut gray = GrayImage::new(width, height);
        for (x, y, pixel) in image.enumerate_pixels() {
            let lum = BackgroundClassifier::pixel_luminance(pixel).round().min(255.0) as u8;
            gray.put_pixel(x, y, Luma([lum]));
        }
        gray
    }

    /// Divide the image by its median-blurred background, rescaled to full
    /// brightness. Zero-background pixels map to zero, matching saturated
    /// integer division.
    fn flatten_illumination(gray: &GrayImage, median_radius: u32) -> GrayImage {
        let background = median_filter(gray, median_radius, median_radius);
        let (width, height) = gray.dimensions();
        let mut out = GrayImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let bg = background.get_pixel(x, y).0[0];
            let value = if bg == 0 {
                0
            } else {
                ((pixel.0[0] as f32 * 255.0 / bg as f32).round()).min(255.0) as u8
            };
            out.put_pixel(x, y, Luma([value]));
        }
        out
    }

    /// Binarize against a Gaussian-weighted local mean: pixels brighter
    /// than `mean - c` become white, everything else black.
    fn adaptive_threshold(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
        let kernel = gaussian_kernel(block_size);
        let local_mean = separable_filter_equal(gray, &kernel);

        let (width, height) = gray.dimensions();
        let mut out = GrayImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let mean = local_mean.get_pixel(x, y).0[0] as f32;
            let value = if pixel.0[0] as f32 > mean - c { 255 } else { 0 };
            out.put_pixel(x, y, Luma([value]));
        }
        out
    }
}

/// Expand a single-channel page to RGB for page placement and encoding.
pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    image::DynamicImage::ImageLuma8(gray.clone()).to_rgb8()
}

/// OpenCV's ksize-to-sigma rule for Gaussian kernels.
fn sigma_for_kernel(kernel_size: u32) -> f32 {
    let k = kernel_size.max(1) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of the given (odd) length.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = if size % 2 == 0 { size + 1 } else { size }.max(1);
    let sigma = sigma_for_kernel(size);
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_scan_options_default() {
        let options = ScanOptions::default();
        assert_eq!(options.median_radius, 10);
        assert_eq!(options.denoise_strength, 15.0);
        assert_eq!(options.adaptive_block_size, 11);
        assert_eq!(options.adaptive_c, 2.0);
        assert_eq!(options.morph_k, 1);
    }

    #[test]
    fn test_monochrome_output_is_two_valued() {
        // Vignetted page with a dark stroke and some specks.
        let mut image = RgbImage::new(48, 48);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let falloff = 200 - ((x as i32 - 24).abs() + (y as i32 - 24).abs()) as u8;
            *pixel = Rgb([falloff, falloff, falloff]);
        }
        for x in 10..38 {
            image.put_pixel(x, 20, Rgb([10, 10, 10]));
            image.put_pixel(x, 21, Rgb([10, 10, 10]));
        }
        image.put_pixel(5, 40, Rgb([0, 0, 0]));
        image.put_pixel(40, 5, Rgb([0, 0, 0]));

        let out = ScanEnhancer::scan_monochrome(&image, &ScanOptions::default());
        assert_eq!(out.dimensions(), (48, 48));
        for pixel in out.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255, "got {}", pixel.0[0]);
        }
    }

    #[test]
    fn test_uniform_page_scans_white() {
        let image = RgbImage::from_pixel(32, 32, Rgb([180, 180, 180]));
        let out = ScanEnhancer::scan_monochrome(&image, &ScanOptions::default());
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_color_variant_is_pass_through() {
        let mut image = RgbImage::from_pixel(16, 16, Rgb([120, 30, 200]));
        image.put_pixel(3, 3, Rgb([0, 255, 0]));
        let out = ScanEnhancer::scan_color(&image);
        assert_eq!(out, image);
    }

    #[test]
    fn test_to_grayscale_bt601() {
        let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let gray = ScanEnhancer::to_grayscale(&image);
        // 0.299 * 255 = 76.2
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
    }

    #[test]
    fn test_flatten_zero_background() {
        let gray = GrayImage::from_pixel(8, 8, Luma([0]));
        let out = ScanEnhancer::flatten_illumination(&gray, 2);
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_flatten_uniform_is_full_brightness() {
        let gray = GrayImage::from_pixel(16, 16, Luma([90]));
        let out = ScanEnhancer::flatten_illumination(&gray, 2);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let kernel = gaussian_kernel(11);
        assert_eq!(kernel.len(), 11);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Symmetric, peaked in the middle.
        assert!((kernel[0] - kernel[10]).abs() < 1e-6);
        assert!(kernel[5] > kernel[0]);
    }

    #[test]
    fn test_sigma_for_kernel_matches_opencv_rule() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(11) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_threshold_separates_stroke() {
        let mut gray = GrayImage::from_pixel(32, 32, Luma([220]));
        for x in 8..24 {
            gray.put_pixel(x, 16, Luma([40]));
        }
        let out = ScanEnhancer::adaptive_threshold(&gray, 11, 2.0);
        assert_eq!(out.get_pixel(16, 16).0[0], 0);
        assert_eq!(out.get_pixel(2, 2).0[0], 255);
    }
}
