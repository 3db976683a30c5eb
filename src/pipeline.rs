//! Pipeline orchestration
//!
//! Composes the reusable stages (input resolution, foreground extraction,
//! scan enhancement, page fitting, PDF encoding) into the supported use
//! cases:
//!
//! - **extract**: cutout of the main object, saved as an image
//! - **scan**: one photo enhanced and placed on a single PDF page
//! - **merge**: many inputs, one page each, in one PDF; a failing input is
//!   logged and skipped, and the batch fails only when nothing succeeds
//!
//! Every invocation is a stateless transform; nothing persists between
//! calls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::ForegroundCropper;
use crate::input::{self, InputError};
use crate::page::PageFitter;
use crate::pdf::{PdfEncoder, PdfError};
use crate::scan::{gray_to_rgb, ScanEnhancer};
use crate::segment::{RembgBackend, SegmentationBackend, UnavailableBackend};

// ============================================================
// Types
// ============================================================

/// Scan enhancement variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Full black-and-white filter chain
    Monochrome,
    /// Color pass-through
    Color,
}

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Could not save output image: {0}")]
    Save(#[from] image::ImageError),

    #[error("No valid inputs to merge")]
    NoValidInputs,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// One input skipped during a merge
#[derive(Debug, Clone)]
pub struct SkippedInput {
    /// Position of the input in the original argument order
    pub index: usize,
    pub input: String,
    pub reason: String,
}

/// Outcome of a merge batch
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub pages_written: usize,
    pub skipped: Vec<SkippedInput>,
}

/// Per-item progress callback for merge batches
pub trait MergeProgress {
    fn on_item_start(&self, _index: usize, _total: usize, _input: &str) {}
    fn on_item_done(&self, _index: usize, _total: usize, _input: &str) {}
    fn on_item_skipped(&self, _index: usize, _input: &str, _reason: &str) {}
}

/// No-op progress callback
pub struct SilentProgress;

impl MergeProgress for SilentProgress {}

// ============================================================
// Pipeline
// ============================================================

/// Stateless processing pipeline for one configuration
pub struct Pipeline {
    config: Config,
    cropper: ForegroundCropper,
}

impl Pipeline {
    /// Build a pipeline with the default segmentation backend (`rembg` on
    /// PATH). A missing backend is not an error here: extraction degrades
    /// to the keep-the-original path when it is first needed.
    pub fn new(config: Config) -> Self {
        let backend: Box<dyn SegmentationBackend> = match RembgBackend::new() {
            Ok(backend) => Box::new(backend),
            Err(e) => Box::new(UnavailableBackend::new(e.to_string())),
        };
        Self::with_backend(config, backend)
    }

    /// Build a pipeline around an injected segmentation backend.
    pub fn with_backend(config: Config, backend: Box<dyn SegmentationBackend>) -> Self {
        let cropper = ForegroundCropper::new(config.extract.clone(), backend);
        Self { config, cropper }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -------- use cases --------

    /// Extract the main object from `input` and save it as an image.
    ///
    /// Returns the path actually written, which may differ from `output`
    /// when the extension names a non-image format.
    pub fn extract(&self, input: &str, output: &Path) -> Result<PathBuf> {
        let image = self.fetch(input)?;
        let cutout = self.cropper.extract_main_object(&image);

        let output = coerce_image_output(output);
        cutout.save(&output)?;
        info!(input, output = %output.display(), "Extracted object");
        Ok(output)
    }

    /// Enhance `input` and write it as a single-page PDF.
    pub fn scan(&self, input: &str, output: &Path, mode: ScanMode) -> Result<PathBuf> {
        let image = self.fetch(input)?;
        let page = self.render_page(&image, Some(mode));

        let output = coerce_document_output(output);
        PdfEncoder::write_pdf(&[page], &self.config.page, &output)?;
        info!(input, output = %output.display(), "Scanned image to PDF");
        Ok(output)
    }

    /// Merge `inputs` into one multi-page PDF, one page per input, in the
    /// original input order. Failing inputs are skipped; the batch fails
    /// only when no input succeeds.
    pub fn merge(
        &self,
        inputs: &[String],
        output: &Path,
        enhance: Option<ScanMode>,
        progress: &dyn MergeProgress,
    ) -> Result<(PathBuf, MergeReport)> {
        let total = inputs.len();
        let mut pages: Vec<RgbImage> = Vec::new();
        let mut skipped: Vec<SkippedInput> = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            progress.on_item_start(index, total, input);
            match self.fetch(input) {
                Ok(image) => {
                    pages.push(self.render_page(&image, enhance));
                    progress.on_item_done(index, total, input);
                }
                Err(e) => {
                    warn!(index, input, error = %e, "Skipping input");
                    progress.on_item_skipped(index, input, &e.to_string());
                    skipped.push(SkippedInput {
                        index,
                        input: input.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if pages.is_empty() {
            return Err(PipelineError::NoValidInputs);
        }

        let output = coerce_document_output(output);
        PdfEncoder::write_pdf(&pages, &self.config.page, &output)?;
        info!(
            pages = pages.len(),
            skipped = skipped.len(),
            output = %output.display(),
            "Merged images to PDF"
        );

        Ok((
            output,
            MergeReport {
                pages_written: pages.len(),
                skipped,
            },
        ))
    }

    // -------- stages --------

    fn fetch(&self, input: &str) -> input::Result<RgbImage> {
        input::load_image(input, Duration::from_secs(self.config.fetch.timeout_secs))
    }

    /// Optionally enhance an image, then fit it onto the page canvas.
    fn render_page(&self, image: &RgbImage, enhance: Option<ScanMode>) -> RgbImage {
        let processed = match enhance {
            Some(ScanMode::Monochrome) => {
                gray_to_rgb(&ScanEnhancer::scan_monochrome(image, &self.config.scan))
            }
            Some(ScanMode::Color) => ScanEnhancer::scan_color(image),
            None => image.clone(),
        };
        PageFitter::place_on_page(&processed, &self.config.page)
    }
}

// ============================================================
// Output path coercion
// ============================================================

/// Supported raster output extensions for the extract use case
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Force an image-format extension (default png) on an output path.
fn coerce_image_output(path: &Path) -> PathBuf {
    let keep = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    if keep {
        path.to_path_buf()
    } else {
        path.with_extension("png")
    }
}

/// Force a `.pdf` extension on a document output path.
fn coerce_document_output(path: &Path) -> PathBuf {
    let keep = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if keep {
        path.to_path_buf()
    } else {
        path.with_extension("pdf")
    }
}

// ============================================================
// Tests
// ============================================================
