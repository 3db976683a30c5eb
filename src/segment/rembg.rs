//! rembg-based segmentation backend
//!
//! Drives the external `rembg` CLI: the input is written to a uniquely
//! named temp PNG, `rembg i <in> <out>` produces the matted RGBA result,
//! and the result is decoded and dimension-checked. Every failure maps to
//! a [`SegmentError`] so callers can fall back to the original image.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{RgbImage, RgbaImage};
use tracing::debug;

use super::{Result, SegmentError, SegmentationBackend};

/// Name of the external rembg executable
const REMBG_COMMAND: &str = "rembg";

/// Segmentation backend backed by the `rembg` command-line tool
pub struct RembgBackend {
    command: PathBuf,
}

impl RembgBackend {
    /// Locate `rembg` on PATH.
    pub fn new() -> Result<Self> {
        let command = which::which(REMBG_COMMAND)
            .map_err(|e| SegmentError::BackendUnavailable(format!("{}: {}", REMBG_COMMAND, e)))?;
        Ok(Self { command })
    }

    /// Use an explicit executable path (no PATH lookup).
    pub fn with_command(command: PathBuf) -> Self {
        Self { command }
    }

    /// Whether `rembg` is available on PATH.
    pub fn is_available() -> bool {
        which::which(REMBG_COMMAND).is_ok()
    }

    /// Resolved path of the executable this backend invokes.
    pub fn command(&self) -> &Path {
        &self.command
    }
}

impl SegmentationBackend for RembgBackend {
    fn segment(&self, image: &RgbImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();

        // Scratch files carry unique per-process names so parallel
        // invocations of the host never collide.
        let dir = tempfile::Builder::new().prefix("flatbed-rembg-").tempdir()?;
        let input_path = dir.path().join("input.png");
        let output_path = dir.path().join("output.png");

        image
            .save(&input_path)
            .map_err(SegmentError::InvalidOutput)?;

        debug!(
            command = %self.command.display(),
            width,
            height,
            "Invoking rembg"
        );

        let output = Command::new(&self.command)
            .arg("i")
            .arg(&input_path)
            .arg(&output_path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SegmentError::CommandFailed(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let result = image::open(&output_path)?.to_rgba8();
        let (got_w, got_h) = result.dimensions();
        if (got_w, got_h) != (width, height) {
            return Err(SegmentError::SizeMismatch {
                want_w: width,
                want_h: height,
                got_w,
                got_h,
            });
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        REMBG_COMMAND
    }
}
