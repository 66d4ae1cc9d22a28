//! File tree value objects
//!
//! This module contains the node types the encoders consume:
//! - **[`FileNode`]**: a file or a directory
//! - **[`File`]**: a name, a lazy [`Content`] and a [`MediaType`]
//! - **[`Directory`]**: a name and an ordered list of children
//! - **[`Name`]**: a validated single path component
//!
//! ## Examples
//!
//! ```rust
//! use packstream::tree::{Directory, File, FileNode, Name};
//! use packstream::content::Content;
//!
//! let log = File::named("symfony.log", Content::of_bytes("[info] booted\n"))?;
//! let fixtures = Directory::named("fixtures")?.add(log);
//!
//! let node = FileNode::from(fixtures);
//! assert_eq!(node.name().as_str(), "fixtures");
//! assert!(node.is_directory());
//! # Ok::<(), packstream::PackError>(())
//! ```

use crate::content::Content;
use crate::error::{PackError, Result};
use std::fmt;
use std::path::Path;

/// Longest name accepted, in bytes
pub const MAX_NAME_LEN: usize = 255;

/// A single path component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    /// Validate and wrap a name
    ///
    /// # Errors
    ///
    /// Rejects empty names, names longer than [`MAX_NAME_LEN`] bytes, names
    /// containing `/` or NUL, and the special names `.` and `..`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.len() > MAX_NAME_LEN {
            Some("name is longer than 255 bytes")
        } else if name.contains('/') {
            Some("name contains '/'")
        } else if name.contains('\0') {
            Some("name contains NUL")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PackError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with `suffix` appended
    pub fn with_suffix(&self, suffix: &str) -> Result<Self> {
        Self::new(format!("{}{}", self.0, suffix))
    }

    /// Name with a trailing `suffix` removed
    ///
    /// Returns the name unchanged when it does not end with `suffix` or when
    /// removing it would leave nothing.
    pub fn strip_suffix(&self, suffix: &str) -> Self {
        match self.0.strip_suffix(suffix) {
            Some(stem) if !stem.is_empty() => Self(stem.to_string()),
            _ => self.clone(),
        }
    }

    /// File extension without the dot, if any
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.0).extension().and_then(|ext| ext.to_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Name {
    type Error = PackError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = PackError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

/// A `type/subtype` media type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// Parse a media type such as `text/plain`
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid = match value.split_once('/') {
            Some((top, sub)) => {
                !top.is_empty()
                    && !sub.is_empty()
                    && !sub.contains('/')
                    && !value.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if valid {
            Ok(Self(value))
        } else {
            Err(PackError::InvalidMediaType(value))
        }
    }

    /// `application/gzip`
    pub fn gzip() -> Self {
        Self("application/gzip".to_string())
    }

    /// `application/x-tar`
    pub fn tar() -> Self {
        Self("application/x-tar".to_string())
    }

    /// `application/octet-stream`
    pub fn octet_stream() -> Self {
        Self("application/octet-stream".to_string())
    }

    /// Guess a media type from a file name extension
    pub fn guess(name: &Name) -> Self {
        let value = match name.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("txt" | "log") => "text/plain",
            Some("md") => "text/markdown",
            Some("html" | "htm") => "text/html",
            Some("css") => "text/css",
            Some("csv") => "text/csv",
            Some("json") => "application/json",
            Some("xml") => "application/xml",
            Some("pdf") => "application/pdf",
            Some("gz") => "application/gzip",
            Some("tar") => "application/x-tar",
            Some("zip") => "application/zip",
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        };
        Self(value.to_string())
    }

    /// Media type as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A leaf of the tree
#[derive(Debug, Clone)]
pub struct File {
    name: Name,
    content: Content,
    media_type: MediaType,
}

impl File {
    /// Create a file
    pub fn new(name: Name, content: Content, media_type: MediaType) -> Self {
        Self {
            name,
            content,
            media_type,
        }
    }

    /// Create a file whose media type is guessed from its name
    pub fn named(name: &str, content: Content) -> Result<Self> {
        let name = Name::new(name)?;
        let media_type = MediaType::guess(&name);
        Ok(Self::new(name, content, media_type))
    }

    /// File name
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// File content
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// File media type
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// Same file under another name
    pub fn rename(self, name: Name) -> Self {
        Self { name, ..self }
    }

    /// Same file with other content
    pub fn with_content(self, content: Content) -> Self {
        Self { content, ..self }
    }

    /// Same file with another media type
    pub fn with_media_type(self, media_type: MediaType) -> Self {
        Self { media_type, ..self }
    }
}

/// A branch of the tree
///
/// Children keep their insertion order; sibling names are unique.
#[derive(Debug, Clone)]
pub struct Directory {
    name: Name,
    children: Vec<FileNode>,
}

impl Directory {
    /// Create an empty directory
    pub fn new(name: Name) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Create an empty directory from a raw name
    pub fn named(name: &str) -> Result<Self> {
        Ok(Self::new(Name::new(name)?))
    }

    /// Directory name
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Add a child, replacing any existing child with the same name in place
    pub fn add(mut self, node: impl Into<FileNode>) -> Self {
        let node = node.into();
        match self.children.iter().position(|child| child.name() == node.name()) {
            Some(index) => self.children[index] = node,
            None => self.children.push(node),
        }
        self
    }

    /// Child with the given name
    pub fn get(&self, name: &Name) -> Option<&FileNode> {
        self.children.iter().find(|child| child.name() == name)
    }

    /// Check whether a child with the given name exists
    pub fn contains(&self, name: &Name) -> bool {
        self.get(name).is_some()
    }

    /// Children in order
    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Iterate over children in order
    pub fn iter(&self) -> std::slice::Iter<'_, FileNode> {
        self.children.iter()
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check whether the directory has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node of the file tree
#[derive(Debug, Clone)]
pub enum FileNode {
    /// Leaf node carrying content
    File(File),
    /// Branch node carrying ordered children
    Directory(Directory),
}

impl FileNode {
    /// Node name
    pub fn name(&self) -> &Name {
        match self {
            FileNode::File(file) => file.name(),
            FileNode::Directory(directory) => directory.name(),
        }
    }

    /// Check whether this node is a directory
    pub fn is_directory(&self) -> bool {
        matches!(self, FileNode::Directory(_))
    }

    /// The file, if this node is one
    pub fn as_file(&self) -> Option<&File> {
        match self {
            FileNode::File(file) => Some(file),
            FileNode::Directory(_) => None,
        }
    }

    /// The directory, if this node is one
    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            FileNode::Directory(directory) => Some(directory),
            FileNode::File(_) => None,
        }
    }
}

impl From<File> for FileNode {
    fn from(file: File) -> Self {
        FileNode::File(file)
    }
}

impl From<Directory> for FileNode {
    fn from(directory: Directory) -> Self {
        FileNode::Directory(directory)
    }
}
