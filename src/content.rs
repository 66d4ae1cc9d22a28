//! File content as a lazy chunk stream
//!
//! [`Content`] pairs a [`Chunks`] sequence with an optional size known up
//! front. Content read from disk records the size from the file metadata and
//! only opens the file when the chunks are enumerated.

use crate::chunks::{ChunkIter, Chunks};
use crate::error::Result;
use bytes::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::trace;

/// Byte content of a file
#[derive(Debug, Clone, Default)]
pub struct Content {
    chunks: Chunks,
    size: Option<u64>,
}

impl Content {
    /// Content held in memory, size known
    pub fn of_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self {
            chunks: Chunks::once(data),
            size: Some(size),
        }
    }

    /// Content of an arbitrary chunk sequence, size unknown
    pub fn of_chunks(chunks: Chunks) -> Self {
        Self { chunks, size: None }
    }

    /// Content of a chunk sequence whose total length the caller vouches for
    ///
    /// Encoders check the claim while streaming and fail on a mismatch.
    pub fn sized(chunks: Chunks, size: u64) -> Self {
        Self {
            chunks,
            size: Some(size),
        }
    }

    /// Content of a file on disk, read lazily in chunks of `chunk_size` bytes
    ///
    /// The size is taken from the file metadata now; the file is opened
    /// again for every enumeration.
    pub fn from_path(path: impl Into<PathBuf>, chunk_size: usize) -> Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let chunk_size = chunk_size.max(1);
        let source = path.clone();
        let chunks = Chunks::from_fn(move || {
            Box::new(FileChunks::new(source.clone(), chunk_size)) as ChunkIter
        });

        Ok(Self {
            chunks,
            size: Some(size),
        })
    }

    /// The chunk sequence
    pub fn chunks(&self) -> &Chunks {
        &self.chunks
    }

    /// Size known without reading the content
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Content length in bytes, summing the chunks when the size is unknown
    pub fn len(&self) -> Result<u64> {
        match self.size {
            Some(size) => Ok(size),
            None => self.chunks.total_len(),
        }
    }

    /// Check whether the content has no bytes
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read the whole content into memory
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.chunks.to_vec()
    }
}

impl From<Chunks> for Content {
    fn from(chunks: Chunks) -> Self {
        Self::of_chunks(chunks)
    }
}

/// Reads a file in fixed-size chunks, opening it on first use
struct FileChunks {
    path: PathBuf,
    chunk_size: usize,
    file: Option<File>,
    done: bool,
}

impl FileChunks {
    fn new(path: PathBuf, chunk_size: usize) -> Self {
        Self {
            path,
            chunk_size,
            file: None,
            done: false,
        }
    }

    fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                trace!("Opening {:?} for reading", self.path);
                File::open(&self.path)?
            }
        };
        let file = self.file.insert(file);

        let mut buffer = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buffer.len() {
            let read = file.read(&mut buffer[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }

        if filled == 0 {
            return Ok(None);
        }
        buffer.truncate(filled);
        Ok(Some(Bytes::from(buffer)))
    }
}

impl Iterator for FileChunks {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                trace!("Finished reading {:?}", self.path);
                self.done = true;
                self.file = None;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
