//! Recursive tar stream encoder

use crate::chunks::{ChunkIter, Chunks};
use crate::clock::Clock;
use crate::content::Content;
use crate::error::{PackError, Result};
use crate::tar::blocks::Blocks;
use crate::tar::header::{EntryKind, Header, NAME_FIELD_LEN};
use crate::tar::{BLOCK_SIZE, END_OF_ARCHIVE_LEN, LONG_LINK_NAME, TAR_SUFFIX};
use crate::tree::{Directory, File, FileNode, MediaType};
use crate::utils::round_up_to_block;
use bytes::Bytes;
use std::iter;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

static END_OF_ARCHIVE: [u8; END_OF_ARCHIVE_LEN] = [0; END_OF_ARCHIVE_LEN];

/// Serializes file trees into tar streams
///
/// Every header reads the clock once, when that header is produced.
#[derive(Clone)]
pub struct Encode {
    clock: Arc<dyn Clock>,
}

impl Encode {
    /// Encoder stamping headers with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Archive stream for `node`, including the end-of-archive marker
    ///
    /// Nothing is read from the tree until the returned chunks are
    /// enumerated; every enumeration re-encodes from scratch.
    pub fn content(&self, node: &FileNode) -> Chunks {
        let clock = self.clock.clone();
        let node = node.clone();
        Chunks::from_fn(move || {
            trace!("Starting tar stream for {}", node.name());
            let path = node.name().as_str().to_string();
            let trailer = iter::once(Ok(Bytes::from_static(&END_OF_ARCHIVE)));
            Box::new(entry(clock.clone(), path, node.clone(), false).chain(trailer)) as ChunkIter
        })
    }

    /// Archive of `node` as a file named `<name>.tar`
    ///
    /// Fails with [`PackError::InvalidName`] when the suffixed name would
    /// exceed 255 bytes, i.e. for root names of 252 bytes or more.
    /// [`Encode::content`] accepts any valid root name.
    pub fn file(&self, node: &FileNode) -> Result<File> {
        let name = node.name().with_suffix(TAR_SUFFIX)?;
        debug!("Encoding {} into {}", node.name(), name);
        Ok(File::new(
            name,
            Content::of_chunks(self.content(node)),
            MediaType::tar(),
        ))
    }

    /// Exact length of the archive [`Encode::content`] produces
    ///
    /// Reads content only for files whose size is not known up front.
    pub fn archive_len(&self, node: &FileNode) -> Result<u64> {
        Ok(entry_len(node.name().as_str(), node)? + END_OF_ARCHIVE_LEN as u64)
    }
}

impl std::fmt::Debug for Encode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encode").finish_non_exhaustive()
    }
}

fn entry(clock: Arc<dyn Clock>, path: String, node: FileNode, link_written: bool) -> ChunkIter {
    if !link_written && path.len() > NAME_FIELD_LEN {
        return long_link(clock, path, node);
    }
    match node {
        FileNode::File(file) => file_entry(clock, path, file),
        FileNode::Directory(directory) => directory_entry(clock, path, directory),
    }
}

/// GNU long name record followed by the entry itself
fn long_link(clock: Arc<dyn Clock>, path: String, node: FileNode) -> ChunkIter {
    let path_len = path.len() as u64;
    let link = header(clock.clone(), LONG_LINK_NAME.to_string(), EntryKind::LongLink, move || {
        Ok(path_len)
    });
    let name = Bytes::from(path.clone().into_bytes());
    let name_blocks = Blocks::new(Box::new(iter::once(Ok::<_, PackError>(name))));

    Box::new(link.chain(name_blocks).chain(entry(clock, path, node, true)))
}

fn file_entry(clock: Arc<dyn Clock>, path: String, file: File) -> ChunkIter {
    let content = file.content().clone();
    let declared = Arc::new(OnceLock::new());

    let sizing = content.clone();
    let recorded = declared.clone();
    let header = header(clock, path.clone(), EntryKind::File, move || {
        let size = sizing.len()?;
        let _ = recorded.set(size);
        Ok(size)
    });

    // Runs only after the header has been produced and recorded its size
    let data = iter::once_with(move || {
        Blocks::new(content.chunks().iter()).declared(path, declared.get().copied())
    })
    .flatten();

    Box::new(header.chain(data))
}

fn directory_entry(clock: Arc<dyn Clock>, path: String, directory: Directory) -> ChunkIter {
    let header = header(clock.clone(), path.clone(), EntryKind::Directory, || Ok(0));
    let children = directory.children().to_vec().into_iter().flat_map(move |child| {
        let child_path = format!("{}/{}", path, child.name());
        entry(clock.clone(), child_path, child, false)
    });

    Box::new(header.chain(children))
}

/// A single lazily packed header block
fn header<F>(clock: Arc<dyn Clock>, path: String, kind: EntryKind, size: F) -> ChunkIter
where
    F: FnOnce() -> Result<u64> + Send + 'static,
{
    Box::new(iter::once_with(move || {
        let size = size()?;
        let header = Header::new(path.as_bytes(), size, kind, clock.unix_seconds())?;
        debug!("Packed {:?} header for {} ({} bytes)", kind, path, size);
        Ok(Bytes::copy_from_slice(header.as_bytes()))
    }))
}

fn entry_len(path: &str, node: &FileNode) -> Result<u64> {
    let header_len = BLOCK_SIZE as u64;
    let link_len = if path.len() > NAME_FIELD_LEN {
        header_len + round_up_to_block(path.len() as u64)
    } else {
        0
    };

    let body_len = match node {
        FileNode::File(file) => header_len + round_up_to_block(file.content().len()?),
        FileNode::Directory(directory) => {
            let mut total = header_len;
            for child in directory.iter() {
                total += entry_len(&format!("{}/{}", path, child.name()), child)?;
            }
            total
        }
    };

    Ok(link_len + body_len)
}
