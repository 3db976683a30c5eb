//! Configuration
//!
//! All pipeline policy values (page size, thresholds, padding ratios) are
//! explicit configuration passed into each component. Defaults match the
//! shipped behavior; a TOML config file can override any section, and CLI
//! flags override the file.
//!
//! Search order: `./flatbed.toml`, then `<config_dir>/flatbed/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::extract::ExtractOptions;
use crate::input::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::page::PageSpec;
use crate::scan::ScanOptions;

/// Config file name searched in the working directory
const LOCAL_CONFIG_FILE: &str = "flatbed.toml";

/// Config file path under the user config directory
const USER_CONFIG_FILE: &str = "flatbed/config.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page canvas geometry and resolution
    pub page: PageSpec,

    /// Foreground extraction policy (includes background classification)
    pub extract: ExtractOptions,

    /// Scan enhancement policy
    pub scan: ScanOptions,

    /// Network fetching policy
    pub fetch: FetchConfig,
}

/// Network fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for a URL fetch, in seconds (single attempt, no retry)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// CLI overrides applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Override the page resolution
    pub dpi: Option<u32>,
}

impl Config {
    /// Load configuration from the default locations, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Candidate config file locations, most specific first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(USER_CONFIG_FILE));
        }
        paths
    }

    /// Apply CLI overrides (CLI wins over the file).
    pub fn merge_with_cli(mut self, overrides: &CliOverrides) -> Self {
        if let Some(dpi) = overrides.dpi {
            self.page.dpi = dpi;
        }
        self
    }
}

// ============================================================
// Tests
// ============================================================
