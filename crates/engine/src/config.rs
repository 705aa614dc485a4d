//! Configuration via `loupe.toml`
//!
//! On first open a default `loupe.toml` is written to the data directory.
//! To change settings, edit the file and reopen.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use loupe_core::{CategoryId, Error, Result, DEFAULT_MAX_BLOB_SIZE};

use crate::enumeration::Strategy;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "loupe.toml";

/// Configuration loaded from `loupe.toml`.
///
/// # Example
///
/// ```toml
/// strategy = "bucket"
/// max_blob_size = 24576
/// blob_dir = "blobs"
/// cached_categories = [0, 3]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoupeConfig {
    /// Enumeration strategy: `"naive"`, `"two-pass"`, `"bitmap"` or `"bucket"`.
    #[serde(default = "default_strategy_str")]
    pub strategy: String,
    /// Largest snapshot blob the store accepts, in bytes.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: usize,
    /// Directory for snapshot blobs. Relative paths resolve against the
    /// data directory. When absent, blobs are kept in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_dir: Option<PathBuf>,
    /// Categories to switch to Enabled by `Loupe::enable_configured_caches`.
    #[serde(default)]
    pub cached_categories: Vec<u32>,
}

fn default_strategy_str() -> String {
    Strategy::default().as_str().to_string()
}

fn default_max_blob_size() -> usize {
    DEFAULT_MAX_BLOB_SIZE
}

impl Default for LoupeConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy_str(),
            max_blob_size: default_max_blob_size(),
            blob_dir: None,
            cached_categories: Vec::new(),
        }
    }
}

impl LoupeConfig {
    /// Parse the strategy string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unknown strategy name.
    pub fn strategy(&self) -> Result<Strategy> {
        self.strategy.parse()
    }

    /// Configured cache categories.
    pub fn cached_categories(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.cached_categories.iter().copied().map(CategoryId)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        self.strategy()?;
        if self.max_blob_size == 0 {
            return Err(Error::Config(
                "max_blob_size in loupe.toml must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Loupe configuration
#
# Enumeration strategy (default: "bucket")
#   "naive"    = linear-scan dedup, correctness baseline
#   "two-pass" = count pass then exact allocation
#   "bitmap"   = low-byte presence bitmap, degrades on collisions
#   "bucket"   = low-byte buckets with overflow chaining
strategy = "bucket"

# Largest snapshot blob in bytes (default: 24576).
# A category whose snapshot would exceed it must be split.
max_blob_size = 24576

# Directory for snapshot blobs, relative to the data directory.
# Leave unset to keep blobs in memory.
# blob_dir = "blobs"

# Categories whose cache is enabled by enable_configured_caches().
# Each must have entries at that point.
cached_categories = []
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: LoupeConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
