//! Error types for the packstream library
//!
//! Every operation returns [`Result<T>`], whose error side is [`PackError`].
//! Errors fall into a small number of [`ErrorKind`]s so callers can tell a
//! rejected byte stream (a codec failure) apart from input the encoders
//! cannot represent (a contract violation) without matching on every variant.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the packstream library
pub type Result<T> = std::result::Result<T, PackError>;

/// Broad classification of a [`PackError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The deflate/inflate engine rejected the data
    Codec,
    /// The encoder was handed something the format cannot represent
    ContractViolation,
    /// Reading or writing the underlying filesystem failed
    Io,
    /// Invalid names, media types or configuration supplied by the caller
    Usage,
}

/// Main error type for all packstream operations
#[derive(Debug, Error)]
pub enum PackError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors while parsing a JSON configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// The gzip compressor reported a failure
    #[error("Compression error: {0}")]
    Compression(String),

    /// The gzip decompressor rejected its input (malformed or truncated)
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// A file yielded a different number of bytes than its declared size
    #[error("Size mismatch for {path}: declared {declared} bytes, content yielded {actual} bytes")]
    SizeMismatch {
        /// Archive path of the entry
        path: String,
        /// Size written into the header
        declared: u64,
        /// Bytes actually produced by the content
        actual: u64,
    },

    /// A numeric value does not fit into its fixed-width header field
    #[error("Value {value} does not fit in tar header field '{field}'")]
    FieldOverflow {
        /// Header field name
        field: &'static str,
        /// Value that overflowed
        value: u64,
    },

    /// A node shape the tar encoder cannot represent
    #[error("Unsupported node: {0}")]
    UnsupportedNode(String),

    /// Invalid file or directory name
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Invalid media type string
    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Entry not found in a mounted filesystem
    #[error("Not found: {0:?}")]
    NotFound(PathBuf),

    /// Path was expected to be a directory
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

impl PackError {
    /// Create a compression error with a custom message
    pub fn compression(msg: impl Into<String>) -> Self {
        PackError::Compression(msg.into())
    }

    /// Create a decompression error with a custom message
    pub fn decompression(msg: impl Into<String>) -> Self {
        PackError::Decompression(msg.into())
    }

    /// Create an invalid configuration error with a custom message
    pub fn configuration(msg: impl Into<String>) -> Self {
        PackError::InvalidConfiguration(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::Compression(_) | PackError::Decompression(_) => ErrorKind::Codec,
            PackError::SizeMismatch { .. }
            | PackError::FieldOverflow { .. }
            | PackError::UnsupportedNode(_) => ErrorKind::ContractViolation,
            PackError::Io(_) | PackError::WalkDir(_) => ErrorKind::Io,
            PackError::Json(_)
            | PackError::InvalidName { .. }
            | PackError::InvalidMediaType(_)
            | PackError::InvalidConfiguration(_)
            | PackError::NotFound(_)
            | PackError::NotADirectory(_) => ErrorKind::Usage,
        }
    }

    /// Check if the compression engine rejected the data
    pub fn is_codec_failure(&self) -> bool {
        self.kind() == ErrorKind::Codec
    }

    /// Check if the encoder was given input it cannot represent
    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }
}
