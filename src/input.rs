//! Input resolution
//!
//! Resolves a path-or-URL input into decoded RGB pixels. URL fetches are a
//! single bounded-timeout attempt with no retry; everything here is fatal
//! for the input that triggered it (batch callers skip and continue).

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use thiserror::Error;
use tracing::debug;

/// Default network fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Input resolution error types
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InputError>;

/// Whether an input string names a URL rather than a filesystem path.
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Resolve a path or URL into a decoded RGB image.
pub fn load_image(location: &str, timeout: Duration) -> Result<RgbImage> {
    if is_url(location) {
        fetch_url(location, timeout)
    } else {
        load_path(Path::new(location))
    }
}

fn load_path(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), "Reading image file");
    Ok(image::open(path)?.to_rgb8())
}

fn fetch_url(url: &str, timeout: Duration) -> Result<RgbImage> {
    debug!(url, timeout_secs = timeout.as_secs(), "Fetching image");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let bytes = client.get(url).send()?.error_for_status()?.bytes()?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}

// ============================================================
// Tests
// ============================================================
