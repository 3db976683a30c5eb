//! Command-line interface definitions
//!
//! Declarative clap surface only; command dispatch lives in main.rs.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// ============================================================
// CLI root
// ============================================================

/// Turn photos of documents and objects into clean images and PDFs
#[derive(Debug, Parser)]
#[command(name = "flatbed", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (default: ./flatbed.toml, then the
    /// user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output resolution in dots per inch
    #[arg(long, global = true, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Cut the main object out of a photo and save it as an image
    Extract(ExtractArgs),

    /// Enhance a photographed document and save it as a one-page PDF
    Scan(ScanArgs),

    /// Combine several images into one PDF, one page per image
    Merge(MergeArgs),

    /// Show version, configuration sources, and tool availability
    Info,
}

// ============================================================
// Per-command arguments
// ============================================================

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input image: a local path or an http(s) URL
    pub input: String,

    /// Output image path (extension forced to an image format)
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Input image: a local path or an http(s) URL
    pub input: String,

    /// Output PDF path (extension forced to .pdf)
    pub output: PathBuf,

    /// Keep colors instead of producing black-and-white output
    #[arg(long)]
    pub color: bool,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Output PDF path (extension forced to .pdf)
    pub output: PathBuf,

    /// Input images, one page each, in this order
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Run each page through the black-and-white scan enhancement
    #[arg(long)]
    pub scan: bool,
}

// ============================================================
// Tests
// ============================================================
