//! Streaming gzip codec
//!
//! This module wraps flate2's incremental gzip encoder and decoder behind
//! functions from one [`Chunks`] sequence to another.
//!
//! ## Overview
//!
//! Compressing a sequence does not compress anything yet. It returns a new
//! lazy sequence; each time that sequence is enumerated a fresh deflate
//! session is opened, every input chunk is fed to it without flushing, and
//! the session is finished after the last input chunk. The output therefore
//! has exactly one chunk per input chunk plus a final chunk holding whatever
//! the finishing call released. Individual output chunks may be empty while
//! the session buffers internally; only their concatenation is meaningful.
//!
//! Because sessions never outlive an enumeration, a produced sequence can be
//! consumed any number of times and always yields the same bytes.
//!
//! ## Format
//!
//! Output is a standard RFC 1952 gzip member at compression level 9 by
//! default. The header carries no file name and a zero modification time,
//! so compressing the same input twice gives byte-identical results.
//!
//! ## Examples
//!
//! ```rust
//! use packstream::chunks::Chunks;
//! use packstream::gzip::Gzip;
//!
//! let input = Chunks::of(["first line\n", "second line\n"]);
//! let compressed = Gzip::compress().chunks(&input);
//! let restored = Gzip::decompress().chunks(&compressed);
//!
//! assert_eq!(restored.to_vec()?, b"first line\nsecond line\n");
//! # Ok::<(), packstream::PackError>(())
//! ```
//!
//! Named files get the `.gz` suffix and the `application/gzip` media type:
//!
//! ```rust
//! use packstream::content::Content;
//! use packstream::gzip::Gzip;
//! use packstream::tree::File;
//!
//! let file = File::named("symfony.log", Content::of_bytes("[info] up\n"))?;
//! let compressed = Gzip::compress().file(&file)?;
//! assert_eq!(compressed.name().as_str(), "symfony.log.gz");
//! assert_eq!(compressed.media_type().as_str(), "application/gzip");
//!
//! let restored = Gzip::decompress().file(&compressed);
//! assert_eq!(restored.name().as_str(), "symfony.log");
//! # Ok::<(), packstream::PackError>(())
//! ```

use crate::chunks::{ChunkIter, Chunks};
use crate::config::MAX_COMPRESSION_LEVEL;
use crate::content::Content;
use crate::error::{PackError, Result};
use crate::tree::{File, MediaType};
use bytes::Bytes;
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Write;
use tracing::{debug, trace};

/// Suffix appended to compressed file names
pub const GZIP_SUFFIX: &str = ".gz";

/// Entry point for the gzip codec
#[derive(Debug, Clone, Copy)]
pub struct Gzip;

impl Gzip {
    /// Compressor at the best compression level
    pub fn compress() -> Compress {
        Compress::max()
    }

    /// Decompressor for gzip framed input
    pub fn decompress() -> Decompress {
        Decompress::new()
    }
}

/// Gzip compressor
///
/// Holds only the compression level; sessions are created per enumeration.
#[derive(Debug, Clone, Copy)]
pub struct Compress {
    level: Compression,
}

impl Compress {
    /// Compressor at level 9
    pub fn max() -> Self {
        Self {
            level: Compression::best(),
        }
    }

    /// Compressor at a specific level
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidConfiguration`] for levels above 9.
    pub fn with_level(level: u32) -> Result<Self> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(PackError::configuration(format!(
                "gzip level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, level
            )));
        }
        Ok(Self {
            level: Compression::new(level),
        })
    }

    /// Configured compression level
    pub fn level(&self) -> u32 {
        self.level.level()
    }

    /// Compress a chunk sequence
    pub fn chunks(&self, input: &Chunks) -> Chunks {
        let level = self.level;
        let input = input.clone();
        Chunks::from_fn(move || {
            trace!("Opening gzip compression session at level {}", level.level());
            Box::new(SessionChunks::new(input.iter(), CompressSession::new(level))) as ChunkIter
        })
    }

    /// Compress file content; the resulting size is unknown until read
    pub fn content(&self, content: &Content) -> Content {
        Content::of_chunks(self.chunks(content.chunks()))
    }

    /// Compress a file, appending `.gz` to its name
    ///
    /// Fails with [`PackError::InvalidName`] when the suffixed name would
    /// exceed 255 bytes, so names of 253 to 255 bytes cannot be compressed
    /// as files. [`Compress::content`] has no such limit.
    pub fn file(&self, file: &File) -> Result<File> {
        let name = file.name().with_suffix(GZIP_SUFFIX)?;
        debug!("Compressing {} into {}", file.name(), name);
        Ok(File::new(name, self.content(file.content()), MediaType::gzip()))
    }

    /// Compress a single in-memory buffer
    pub fn bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.chunks(&Chunks::once(Bytes::copy_from_slice(data))).to_vec()
    }
}

impl Default for Compress {
    fn default() -> Self {
        Self::max()
    }
}

/// Gzip decompressor
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompress;

impl Decompress {
    /// Create a decompressor
    pub fn new() -> Self {
        Self
    }

    /// Decompress a chunk sequence
    ///
    /// Malformed framing surfaces as an error item at the chunk where it is
    /// detected; a truncated stream surfaces as an error in place of the
    /// final chunk.
    pub fn chunks(&self, input: &Chunks) -> Chunks {
        let input = input.clone();
        Chunks::from_fn(move || {
            trace!("Opening gzip decompression session");
            Box::new(SessionChunks::new(input.iter(), DecompressSession::new())) as ChunkIter
        })
    }

    /// Decompress file content
    pub fn content(&self, content: &Content) -> Content {
        Content::of_chunks(self.chunks(content.chunks()))
    }

    /// Decompress a file, removing a trailing `.gz` from its name
    ///
    /// The suffix is kept when the name is nothing but `.gz`. The media type
    /// is left unchanged.
    pub fn file(&self, file: &File) -> File {
        let name = file.name().strip_suffix(GZIP_SUFFIX);
        debug!("Decompressing {} into {}", file.name(), name);
        File::new(name, self.content(file.content()), file.media_type().clone())
    }

    /// Decompress a single in-memory buffer
    pub fn bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.chunks(&Chunks::once(Bytes::copy_from_slice(data))).to_vec()
    }
}

/// One live deflate or inflate context
trait Session {
    /// Feed a chunk without flushing, returning the output released so far
    fn feed(&mut self, data: &[u8]) -> Result<Bytes>;

    /// Finalize the stream, returning the remaining output
    fn finish(&mut self) -> Result<Bytes>;
}

struct CompressSession {
    encoder: GzEncoder<Vec<u8>>,
    bytes_in: u64,
    bytes_out: u64,
}

impl CompressSession {
    fn new(level: Compression) -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), level),
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    fn take_output(&mut self) -> Bytes {
        let output = std::mem::take(self.encoder.get_mut());
        self.bytes_out += output.len() as u64;
        Bytes::from(output)
    }
}

impl Session for CompressSession {
    fn feed(&mut self, data: &[u8]) -> Result<Bytes> {
        self.encoder
            .write_all(data)
            .map_err(|e| PackError::compression(format!("Failed to compress data: {}", e)))?;
        self.bytes_in += data.len() as u64;
        Ok(self.take_output())
    }

    fn finish(&mut self) -> Result<Bytes> {
        self.encoder
            .try_finish()
            .map_err(|e| PackError::compression(format!("Failed to finish gzip stream: {}", e)))?;
        let output = self.take_output();
        trace!(
            "Gzip compression session finished: {} -> {} bytes",
            self.bytes_in,
            self.bytes_out
        );
        Ok(output)
    }
}

struct DecompressSession {
    decoder: GzDecoder<Vec<u8>>,
    bytes_in: u64,
    bytes_out: u64,
}

impl DecompressSession {
    fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    fn take_output(&mut self) -> Bytes {
        let output = std::mem::take(self.decoder.get_mut());
        self.bytes_out += output.len() as u64;
        Bytes::from(output)
    }
}

impl Session for DecompressSession {
    fn feed(&mut self, data: &[u8]) -> Result<Bytes> {
        self.decoder
            .write_all(data)
            .map_err(|e| PackError::decompression(format!("Failed to decompress data: {}", e)))?;
        self.bytes_in += data.len() as u64;
        Ok(self.take_output())
    }

    fn finish(&mut self) -> Result<Bytes> {
        self.decoder
            .try_finish()
            .map_err(|e| PackError::decompression(format!("Failed to finish gzip stream: {}", e)))?;
        let output = self.take_output();
        trace!(
            "Gzip decompression session finished: {} -> {} bytes",
            self.bytes_in,
            self.bytes_out
        );
        Ok(output)
    }
}

/// Drives a session over an input enumeration
///
/// The session lives exactly as long as this iterator and is dropped early
/// on the first error.
struct SessionChunks<S> {
    input: ChunkIter,
    session: Option<S>,
}

impl<S: Session> SessionChunks<S> {
    fn new(input: ChunkIter, session: S) -> Self {
        Self {
            input,
            session: Some(session),
        }
    }
}

impl<S: Session> Iterator for SessionChunks<S> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        let session = self.session.as_mut()?;
        match self.input.next() {
            Some(Ok(chunk)) => {
                let output = session.feed(&chunk);
                if output.is_err() {
                    self.session = None;
                }
                Some(output)
            }
            Some(Err(e)) => {
                self.session = None;
                Some(Err(e))
            }
            None => {
                let output = session.finish();
                self.session = None;
                Some(output)
            }
        }
    }
}
