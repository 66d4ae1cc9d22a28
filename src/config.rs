//! Runtime configuration
//!
//! [`PackConfig`] collects the few knobs the codecs and the filesystem
//! adapter expose. It can be built in code or loaded from a JSON file; every
//! field has a default, so a config file only needs the fields it changes.
//!
//! ```rust
//! use packstream::config::PackConfig;
//!
//! let config: PackConfig = serde_json::from_str(r#"{ "read_chunk_size": 65536 }"#)?;
//! assert_eq!(config.compression_level, 9);
//! assert_eq!(config.read_chunk_size, 65536);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Highest gzip compression level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Default size of chunks read from disk
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8192;

/// Settings shared by the codecs and the filesystem adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Gzip compression level, 0 (store) to 9 (best)
    pub compression_level: u32,
    /// Size of the chunks file content is read in
    pub read_chunk_size: usize,
    /// Whether the filesystem adapter follows symbolic links
    pub follow_symlinks: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            compression_level: MAX_COMPRESSION_LEVEL,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            follow_symlinks: false,
        }
    }
}

impl PackConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PackConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    /// Set the compression level
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the read chunk size
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set whether symbolic links are followed
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(PackError::configuration(format!(
                "compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            )));
        }
        if self.read_chunk_size == 0 {
            return Err(PackError::configuration("read_chunk_size must be greater than 0"));
        }
        Ok(())
    }
}
