//! flatbed - photo-to-document converter
//!
//! Takes phone photos of documents and objects and produces clean images
//! and printable PDFs. Three use cases:
//!
//! - **extract**: segment the main object, crop it with padding, and
//!   composite it on white
//! - **scan**: run a flatbed-style enhancement chain and fit the result
//!   onto a PDF page
//! - **merge**: many images into one PDF, one page per image
//!
//! Inputs come from the local filesystem or over http(s). The crate is a
//! library plus a thin CLI binary; [`pipeline::Pipeline`] is the main
//! entry point for library users.

pub mod background;
pub mod cli;
pub mod config;
pub mod extract;
pub mod input;
pub mod page;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod segment;

// Background classification
pub use background::{BackgroundClassifier, BackgroundOptions};

// CLI
pub use cli::{Cli, Commands, ExtractArgs, MergeArgs, ScanArgs};

// Config
pub use config::{CliOverrides, Config, ConfigError, FetchConfig};

// Foreground extraction
pub use extract::{ExtractOptions, ForegroundCropper, ObjectBounds};

// Input resolution
pub use input::{load_image, InputError};

// Page geometry and PDF output
pub use page::{PageFitter, PageSpec};
pub use pdf::{PdfEncoder, PdfError};

// Pipeline
pub use pipeline::{
    MergeProgress, MergeReport, Pipeline, PipelineError, ScanMode, SilentProgress, SkippedInput,
};

// Scan enhancement
pub use scan::{ScanEnhancer, ScanOptions};

// Segmentation backends
pub use segment::{RembgBackend, SegmentError, SegmentationBackend, UnavailableBackend};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
}
