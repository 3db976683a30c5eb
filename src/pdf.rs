//! Page container encoding
//!
//! Serializes an ordered sequence of fixed-size page images into one PDF:
//! one physical page per image, raster embedded at the page's resolution
//! so it fills the sheet.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::RgbImage;
use printpdf::{ImageTransform, Mm, PdfDocument};
use thiserror::Error;
use tracing::info;

use crate::page::PageSpec;

/// Document title embedded in the PDF metadata
const DOCUMENT_TITLE: &str = "flatbed scan";

/// PDF encoding error types
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("No pages to encode")]
    NoPages,

    #[error("Page {0} has an invalid pixel buffer")]
    InvalidPage(usize),

    #[error("PDF encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Multi-page PDF encoder
pub struct PdfEncoder;

impl PdfEncoder {
    /// Write `pages` to `path` as a PDF, one page image per sheet, in
    /// call order. Fails on an empty page list.
    pub fn write_pdf(pages: &[RgbImage], spec: &PageSpec, path: &Path) -> Result<()> {
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        let width = Mm(spec.width_mm);
        let height = Mm(spec.height_mm);
        let (doc, first_page, first_layer) =
            PdfDocument::new(DOCUMENT_TITLE, width, height, "Page 1");

        for (idx, page) in pages.iter().enumerate() {
            let layer = if idx == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_idx, layer_idx) =
                    doc.add_page(width, height, format!("Page {}", idx + 1));
                doc.get_page(page_idx).get_layer(layer_idx)
            };

            // printpdf bundles its own copy of the image crate, so the raw
            // RGB bytes cross the boundary instead of a DynamicImage.
            let (px_w, px_h) = page.dimensions();
            let raw = printpdf::image_crate::RgbImage::from_raw(px_w, px_h, page.as_raw().clone())
                .ok_or(PdfError::InvalidPage(idx))?;
            let embedded = printpdf::Image::from_dynamic_image(
                &printpdf::image_crate::DynamicImage::ImageRgb8(raw),
            );
            embedded.add_to_layer(
                layer,
                ImageTransform {
                    dpi: Some(spec.dpi as f32),
                    ..Default::default()
                },
            );
        }

        let file = File::create(path)?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| PdfError::Encode(e.to_string()))?;

        info!(pages = pages.len(), path = %path.display(), "Wrote PDF");
        Ok(())
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn tiny_spec() -> PageSpec {
        PageSpec {
            width_mm: 20.0,
            height_mm: 30.0,
            dpi: 254,
        }
    }

    #[test]
    fn test_empty_page_list_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let result = PdfEncoder::write_pdf(&[], &tiny_spec(), &path);
        assert!(matches!(result, Err(PdfError::NoPages)));
        assert!(!path.exists());
    }

    #[test]
    fn test_single_page_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.pdf");
        let page = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));

        PdfEncoder::write_pdf(&[page], &tiny_spec(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 100);
    }

    #[test]
    fn test_multi_page_grows_output() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.pdf");
        let three = dir.path().join("three.pdf");

        let mut page = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
        for x in 0..200 {
            page.put_pixel(x, 150, Rgb([0, 0, 0]));
        }

        PdfEncoder::write_pdf(std::slice::from_ref(&page), &tiny_spec(), &one).unwrap();
        PdfEncoder::write_pdf(&[page.clone(), page.clone(), page], &tiny_spec(), &three).unwrap();

        let one_len = std::fs::metadata(&one).unwrap().len();
        let three_len = std::fs::metadata(&three).unwrap().len();
        assert!(three_len > one_len);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let page = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let result = PdfEncoder::write_pdf(
            &[page],
            &tiny_spec(),
            Path::new("/nonexistent-dir/out.pdf"),
        );
        assert!(matches!(result, Err(PdfError::Io(_))));
    }
}
