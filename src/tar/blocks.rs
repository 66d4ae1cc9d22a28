//! Re-chunking of entry data into 512-byte blocks

use crate::chunks::ChunkIter;
use crate::error::{PackError, Result};
use crate::tar::BLOCK_SIZE;
use bytes::{Bytes, BytesMut};
use tracing::trace;

/// Regroups a chunk stream into whole blocks, NUL-padding the last one
///
/// Each output chunk is a non-empty multiple of [`BLOCK_SIZE`]. Empty input
/// produces no blocks at all. When a declared size is attached, the stream
/// fails with [`PackError::SizeMismatch`] as soon as the input is known to
/// disagree with it.
pub(crate) struct Blocks {
    input: ChunkIter,
    pending: BytesMut,
    seen: u64,
    declared: Option<(String, u64)>,
    done: bool,
}

impl Blocks {
    pub(crate) fn new(input: ChunkIter) -> Self {
        Self {
            input,
            pending: BytesMut::new(),
            seen: 0,
            declared: None,
            done: false,
        }
    }

    /// Fail unless the input yields exactly `size` bytes
    pub(crate) fn declared(mut self, path: String, size: Option<u64>) -> Self {
        self.declared = size.map(|size| (path, size));
        self
    }

    fn mismatch(&self) -> Option<PackError> {
        match &self.declared {
            Some((path, declared)) if *declared != self.seen => Some(PackError::SizeMismatch {
                path: path.clone(),
                declared: *declared,
                actual: self.seen,
            }),
            _ => None,
        }
    }

    fn overrun(&self) -> bool {
        matches!(&self.declared, Some((_, declared)) if self.seen > *declared)
    }
}

impl Iterator for Blocks {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.input.next() {
                Some(Ok(chunk)) => {
                    self.seen += chunk.len() as u64;
                    if self.overrun() {
                        self.done = true;
                        return self.mismatch().map(Err);
                    }
                    self.pending.extend_from_slice(&chunk);
                    if self.pending.len() >= BLOCK_SIZE {
                        let whole = self.pending.len() / BLOCK_SIZE * BLOCK_SIZE;
                        return Some(Ok(self.pending.split_to(whole).freeze()));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if let Some(err) = self.mismatch() {
                        return Some(Err(err));
                    }
                    trace!("Block stream finished after {} bytes", self.seen);
                    if self.pending.is_empty() {
                        return None;
                    }
                    self.pending.resize(BLOCK_SIZE, 0);
                    return Some(Ok(self.pending.split().freeze()));
                }
            }
        }
        None
    }
}
