//! Restartable lazy chunk sequences
//!
//! A [`Chunks`] value describes an ordered stream of byte buffers without
//! holding it. Every call to [`Chunks::iter`] starts a brand new enumeration,
//! so anything stateful a producer needs (an open file handle, a deflate
//! session) is created inside that enumeration and dropped with it. Two
//! enumerations of the same value observe the same bytes.
//!
//! ## Examples
//!
//! ```rust
//! use packstream::chunks::Chunks;
//!
//! let chunks = Chunks::of(["hello ", "world"]);
//!
//! // Enumerating twice yields the same bytes both times
//! assert_eq!(chunks.to_vec()?, b"hello world");
//! assert_eq!(chunks.to_vec()?, b"hello world");
//! # Ok::<(), packstream::PackError>(())
//! ```

use crate::error::Result;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Iterator produced by one enumeration of a [`Chunks`]
pub type ChunkIter = Box<dyn Iterator<Item = Result<Bytes>> + Send>;

type Producer = dyn Fn() -> ChunkIter + Send + Sync;

/// Ordered, lazily produced sequence of byte buffers
///
/// Cloning is cheap: clones share the producer, never any enumeration state.
#[derive(Clone)]
pub struct Chunks {
    producer: Arc<Producer>,
}

impl Chunks {
    /// Build a sequence from a producer called once per enumeration
    ///
    /// The producer must return an iterator yielding the same items on
    /// every call.
    pub fn from_fn<F>(producer: F) -> Self
    where
        F: Fn() -> ChunkIter + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// Sequence with no chunks
    pub fn empty() -> Self {
        Self::from_fn(|| Box::new(std::iter::empty()))
    }

    /// Sequence made of a single chunk
    pub fn once(chunk: impl Into<Bytes>) -> Self {
        let chunk = chunk.into();
        Self::from_fn(move || Box::new(std::iter::once(Ok(chunk.clone()))))
    }

    /// Sequence made of the given in-memory chunks, in order
    pub fn of<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        Self::from_fn(move || Box::new(chunks.clone().into_iter().map(Ok)))
    }

    /// Start a new enumeration
    ///
    /// Once the returned iterator yields an error it yields nothing more.
    pub fn iter(&self) -> ChunkIter {
        Box::new(StopOnError::new((self.producer)()))
    }

    /// Sequence yielding all chunks of `self` followed by all chunks of `next`
    pub fn chain(&self, next: &Chunks) -> Chunks {
        let first = self.clone();
        let second = next.clone();
        Self::from_fn(move || Box::new(first.iter().chain(second.iter())))
    }

    /// Concatenate every chunk into one buffer
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in self.iter() {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Sum of all chunk lengths, enumerating the sequence once
    pub fn total_len(&self) -> Result<u64> {
        self.iter()
            .try_fold(0u64, |sum, chunk| Ok(sum + chunk?.len() as u64))
    }
}

impl fmt::Debug for Chunks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Chunks(..)")
    }
}

impl Default for Chunks {
    fn default() -> Self {
        Self::empty()
    }
}

impl IntoIterator for &Chunks {
    type Item = Result<Bytes>;
    type IntoIter = ChunkIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Fuses an iterator after its first error
struct StopOnError<I> {
    inner: I,
    failed: bool,
}

impl<I> StopOnError<I> {
    fn new(inner: I) -> Self {
        Self { inner, failed: false }
    }
}

impl<I: Iterator<Item = Result<Bytes>>> Iterator for StopOnError<I> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
