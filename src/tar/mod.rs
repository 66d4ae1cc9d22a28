//! Tar archive encoding
//!
//! Trees of [`FileNode`](crate::tree::FileNode)s are serialized into the GNU
//! flavour of USTAR. Entries appear in pre-order: a directory header comes
//! before its children, and children keep the order they were added in.
//! Paths longer than the 100-byte name field are carried by a preceding
//! `././@LongLink` record.
//!
//! ```rust
//! use packstream::{Content, Directory, File, FrozenClock, Tar};
//!
//! let tree = Directory::named("fixtures")?
//!     .add(File::named("symfony.log", Content::of_bytes("log line\n"))?);
//! let archive = Tar::encode(FrozenClock::at_unix(0)).content(&tree.into());
//! assert_eq!(archive.to_vec()?.len(), 512 * 5);
//! # Ok::<(), packstream::PackError>(())
//! ```

mod blocks;
mod encode;
pub mod header;

pub use encode::Encode;
pub use header::{EntryKind, Header};

use crate::clock::Clock;
use std::sync::Arc;

/// Size of a header or data block
pub const BLOCK_SIZE: usize = 512;

/// Zero bytes closing every archive
pub const END_OF_ARCHIVE_LEN: usize = 2 * BLOCK_SIZE;

/// Name of the record carrying an overlong path
pub const LONG_LINK_NAME: &str = "././@LongLink";

/// Suffix appended to archive file names
pub const TAR_SUFFIX: &str = ".tar";

/// Entry point for tar operations
#[derive(Debug, Clone, Copy)]
pub struct Tar;

impl Tar {
    /// Encoder stamping header mtimes from `clock`
    pub fn encode<C: Clock + 'static>(clock: C) -> Encode {
        Encode::new(Arc::new(clock))
    }
}
