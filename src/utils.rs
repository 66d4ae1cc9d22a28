//! Utility functions for packstream
//!
//! Block arithmetic shared by the tar encoder, human-readable sizes for the
//! command line, and atomic streaming writes used by the filesystem adapter.

use crate::chunks::Chunks;
use crate::error::Result;
use crate::tar::BLOCK_SIZE;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

/// Round `len` up to a whole number of tar blocks
pub fn round_up_to_block(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    len.div_ceil(block) * block
}

/// Format bytes as human-readable string
///
/// Uses binary units (1024-based). Values below 1024 are shown as whole
/// numbers, larger values with two decimal places.
///
/// ```rust
/// use packstream::utils::format_bytes;
///
/// assert_eq!(format_bytes(1023), "1023 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Stream `chunks` into `path` atomically
///
/// Chunks go to a temporary file in the target directory which is renamed
/// over `path` once every chunk has been written. A failing chunk leaves
/// `path` untouched. Returns the number of bytes written.
pub fn write_chunks_atomically(path: &Path, chunks: &Chunks) -> Result<u64> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;

    let mut written = 0u64;
    for chunk in chunks {
        let chunk = chunk?;
        temp.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    temp.flush()?;

    temp.persist(path).map_err(|e| e.error)?;
    trace!("Wrote {} to {:?}", format_bytes(written), path);
    Ok(written)
}
