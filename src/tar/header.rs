//! Tar header records
//!
//! A header is one 512-byte block of fixed-width fields. Text fields are
//! NUL-padded and silently truncated to their width; numeric fields are
//! zero-padded octal ASCII followed by a NUL. The layout follows the GNU
//! flavour of USTAR (`"ustar "` magic, `" "` version).
//!
//! The checksum is computed in two passes: the header is first assembled
//! with eight spaces in the checksum field, every byte is summed as an
//! unsigned value, and the sum is then written back as six octal digits, a
//! NUL and a space.

use crate::error::{PackError, Result};
use crate::tar::BLOCK_SIZE;

/// Byte range of a header field
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    offset: usize,
    len: usize,
}

impl Field {
    const fn new(name: &'static str, offset: usize, len: usize) -> Self {
        Self { name, offset, len }
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

const NAME: Field = Field::new("name", 0, 100);
const MODE: Field = Field::new("mode", 100, 8);
const UID: Field = Field::new("uid", 108, 8);
const GID: Field = Field::new("gid", 116, 8);
const SIZE: Field = Field::new("size", 124, 12);
const MTIME: Field = Field::new("mtime", 136, 12);
const CHECKSUM: Field = Field::new("checksum", 148, 8);
const TYPEFLAG: Field = Field::new("typeflag", 156, 1);
const MAGIC: Field = Field::new("magic", 257, 6);
const VERSION: Field = Field::new("version", 263, 2);

// linkname, uname, gname, devmajor, devminor, prefix and the trailing pad
// stay NUL-filled.

/// Width of the name field; longer paths need a long-link record
pub const NAME_FIELD_LEN: usize = NAME.len;

const USTAR_MAGIC: &[u8] = b"ustar ";
const USTAR_VERSION: &[u8] = b" ";

/// Kind of entry a header introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// GNU long name record carrying the path of the next entry
    LongLink,
}

impl EntryKind {
    /// Permission bits written for this kind
    pub fn mode(self) -> u32 {
        match self {
            EntryKind::File => 0o644,
            EntryKind::Directory | EntryKind::LongLink => 0o755,
        }
    }

    /// Type flag byte
    pub fn type_flag(self) -> u8 {
        match self {
            EntryKind::File => b'0',
            EntryKind::Directory => b'5',
            EntryKind::LongLink => b'L',
        }
    }
}

/// A packed 512-byte header block
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    block: [u8; BLOCK_SIZE],
}

impl Header {
    /// Pack a header
    ///
    /// `path` longer than the name field is truncated. Ownership is always
    /// root (uid/gid 0).
    ///
    /// # Errors
    ///
    /// Returns [`PackError::FieldOverflow`] when `size` or `mtime` has more
    /// octal digits than its field can hold.
    pub fn new(path: &[u8], size: u64, kind: EntryKind, mtime: u64) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];

        write_text(&mut block, NAME, path);
        write_octal(&mut block, MODE, u64::from(kind.mode()), 7)?;
        write_octal(&mut block, UID, 0, 7)?;
        write_octal(&mut block, GID, 0, 7)?;
        write_octal(&mut block, SIZE, size, 11)?;
        write_octal(&mut block, MTIME, mtime, 11)?;
        block[CHECKSUM.range()].fill(b' ');
        block[TYPEFLAG.offset] = kind.type_flag();
        write_text(&mut block, MAGIC, USTAR_MAGIC);
        write_text(&mut block, VERSION, USTAR_VERSION);

        let checksum = block.iter().map(|&byte| u32::from(byte)).sum::<u32>();
        let packed = format!("{:06o}\0 ", checksum);
        write_text(&mut block, CHECKSUM, packed.as_bytes());

        Ok(Self { block })
    }

    /// Raw header bytes
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.block
    }

    /// Checksum stored in the header
    pub fn stored_checksum(&self) -> Option<u32> {
        let field = &self.block[CHECKSUM.range()];
        let digits = field.split(|&b| b == 0).next()?;
        let digits = std::str::from_utf8(digits).ok()?.trim();
        u32::from_str_radix(digits, 8).ok()
    }

    /// Checksum recomputed with the checksum field read as spaces
    pub fn computed_checksum(&self) -> u32 {
        self.block
            .iter()
            .enumerate()
            .map(|(index, &byte)| {
                if CHECKSUM.range().contains(&index) {
                    u32::from(b' ')
                } else {
                    u32::from(byte)
                }
            })
            .sum()
    }

    /// Entry kind written in the type flag
    pub fn kind(&self) -> Option<EntryKind> {
        match self.block[TYPEFLAG.offset] {
            b'0' => Some(EntryKind::File),
            b'5' => Some(EntryKind::Directory),
            b'L' => Some(EntryKind::LongLink),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = &self.block[NAME.range()];
        let name_len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        f.debug_struct("Header")
            .field("name", &String::from_utf8_lossy(&name[..name_len]))
            .field("kind", &self.kind())
            .field("checksum", &self.stored_checksum())
            .finish()
    }
}

/// Copy `value` into `field`, truncating to its width
fn write_text(block: &mut [u8; BLOCK_SIZE], field: Field, value: &[u8]) {
    let len = value.len().min(field.len);
    block[field.offset..field.offset + len].copy_from_slice(&value[..len]);
}

/// Write `value` as zero-padded octal of at least `digits` digits
fn write_octal(block: &mut [u8; BLOCK_SIZE], field: Field, value: u64, digits: usize) -> Result<()> {
    let text = format!("{:0width$o}", value, width = digits);
    if text.len() > field.len {
        return Err(PackError::FieldOverflow {
            field: field.name,
            value,
        });
    }
    write_text(block, field, text.as_bytes());
    Ok(())
}
