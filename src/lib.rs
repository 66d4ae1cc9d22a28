//! # Packstream - streaming gzip and tar encoders
//!
//! Packstream turns file trees into tar archives and gzip streams without
//! holding whole files in memory. Every codec works on lazy, restartable
//! chunk sequences: nothing is read until the output is enumerated, and each
//! enumeration starts over from fresh state.
//!
//! ## Overview
//!
//! - [`Gzip`] compresses and decompresses chunk sequences, contents and
//!   files (RFC 1952, level 9 by default)
//! - [`Tar`] serializes a [`FileNode`] tree into a GNU/USTAR archive, using
//!   `././@LongLink` records for paths longer than 100 bytes
//! - [`Filesystem`] loads trees from local disk and writes them back
//!
//! ## Quick Start
//!
//! ```rust
//! use packstream::{Content, Directory, File, FrozenClock, Gzip, Tar};
//!
//! # fn main() -> packstream::Result<()> {
//! let tree = Directory::named("fixtures")?
//!     .add(File::named("symfony.log", Content::of_bytes("[info] started\n"))?);
//!
//! // fixtures.tar, then fixtures.tar.gz
//! let archive = Tar::encode(FrozenClock::at_unix(0)).file(&tree.into())?;
//! let compressed = Gzip::compress().file(&archive)?;
//! assert_eq!(compressed.name().as_str(), "fixtures.tar.gz");
//!
//! // Decompressing restores the exact archive bytes
//! let restored = Gzip::decompress().file(&compressed);
//! assert_eq!(restored.content().to_vec()?, archive.content().to_vec()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming Model
//!
//! A [`Chunks`] value is a recipe for an iterator of `Result<Bytes>`. Codecs
//! map one recipe to another, so composing `Tar` and `Gzip` costs nothing
//! until the final stream is consumed. Errors end the stream: once a chunk
//! iterator yields an error it yields nothing more.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with a [`PackError`]. Use
//! [`PackError::kind`] to tell codec failures (corrupt gzip data) from
//! contract violations (a file whose declared size disagrees with its
//! content) and I/O or usage errors.
//!
//! ## Module Organization
//!
//! - [`chunks`]: restartable chunk sequences
//! - [`content`]: file content with an optional known size
//! - [`tree`]: names, media types, files and directories
//! - [`gzip`]: gzip codec
//! - [`tar`]: tar encoder and header layout
//! - [`filesystem`]: local-disk adapter
//! - [`clock`]: time sources for header timestamps
//! - [`config`]: runtime configuration
//! - [`error`]: error types

pub mod chunks;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod filesystem;
pub mod gzip;
pub mod tar;
pub mod tree;
pub mod utils;

// Re-exports for convenience
pub use crate::chunks::{ChunkIter, Chunks};
pub use crate::clock::{Clock, FrozenClock, SystemClock};
pub use crate::config::PackConfig;
pub use crate::content::Content;
pub use crate::error::{ErrorKind, PackError, Result};
pub use crate::filesystem::Filesystem;
pub use crate::gzip::{Compress, Decompress, Gzip};
pub use crate::tar::{Encode, Tar};
pub use crate::tree::{Directory, File, FileNode, MediaType, Name};
