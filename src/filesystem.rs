//! Local-disk adapter for file trees
//!
//! A [`Filesystem`] is mounted on an existing directory. [`Filesystem::get`]
//! loads direct children of that directory as [`FileNode`] trees whose file
//! contents stay on disk until enumerated, and [`Filesystem::add`] writes a
//! tree back out by streaming its chunks.
//!
//! ## Example
//!
//! ```rust,no_run
//! use packstream::{FileNode, Filesystem, Gzip, Name, PackConfig};
//!
//! # fn main() -> packstream::Result<()> {
//! let fs = Filesystem::mount("./fixtures", PackConfig::default())?;
//! if let Some(FileNode::File(file)) = fs.get(&Name::new("symfony.log")?)? {
//!     fs.add(&Gzip::compress().file(&file)?.into())?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::PackConfig;
use crate::content::Content;
use crate::error::{PackError, Result};
use crate::tree::{Directory, File, FileNode, MediaType, Name};
use crate::utils::write_chunks_atomically;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

/// A directory on local disk holding file trees
#[derive(Debug, Clone)]
pub struct Filesystem {
    root: PathBuf,
    config: PackConfig,
}

impl Filesystem {
    /// Mount an existing directory
    ///
    /// # Errors
    ///
    /// - [`PackError::NotFound`] if `root` does not exist
    /// - [`PackError::NotADirectory`] if `root` is not a directory
    /// - [`PackError::InvalidConfiguration`] if `config` does not validate
    pub fn mount(root: impl Into<PathBuf>, config: PackConfig) -> Result<Self> {
        let root = root.into();
        config.validate()?;

        if !root.exists() {
            return Err(PackError::NotFound(root));
        }
        if !root.is_dir() {
            return Err(PackError::NotADirectory(root));
        }

        debug!("Mounted {:?}", root);
        Ok(Self { root, config })
    }

    /// Mounted directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration in effect
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Check whether the root has an entry called `name`
    pub fn contains(&self, name: &Name) -> bool {
        fs::symlink_metadata(self.root.join(name.as_str())).is_ok()
    }

    /// Load the entry called `name`
    ///
    /// Directories are loaded recursively with children sorted by file
    /// name. Returns `None` when there is no such entry or when the entry
    /// is skipped (an unfollowed symlink or a special file).
    #[instrument(skip(self), fields(root = ?self.root))]
    pub fn get(&self, name: &Name) -> Result<Option<FileNode>> {
        let path = self.root.join(name.as_str());
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file_type = if metadata.file_type().is_symlink() && self.config.follow_symlinks {
            fs::metadata(&path)?.file_type()
        } else {
            metadata.file_type()
        };

        self.load(&path, name.clone(), file_type)
    }

    /// Write `node` under the root, replacing entries of the same name
    ///
    /// Files are streamed to a temporary file and renamed into place;
    /// directories are created as needed and merged with existing ones.
    #[instrument(skip(self, node), fields(name = %node.name()))]
    pub fn add(&self, node: &FileNode) -> Result<()> {
        write_node(&self.root, node)
    }

    fn load(&self, path: &Path, name: Name, file_type: fs::FileType) -> Result<Option<FileNode>> {
        if file_type.is_file() {
            let content = Content::from_path(path, self.config.read_chunk_size)?;
            let media_type = MediaType::guess(&name);
            trace!("Loaded file {:?}", path);
            return Ok(Some(File::new(name, content, media_type).into()));
        }

        if file_type.is_dir() {
            return self.load_directory(path, name).map(|dir| Some(dir.into()));
        }

        if file_type.is_symlink() {
            warn!("Skipping symbolic link {:?}", path);
        } else {
            warn!("Skipping special file {:?}", path);
        }
        Ok(None)
    }

    fn load_directory(&self, path: &Path, name: Name) -> Result<Directory> {
        let mut directory = Directory::new(name);

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str() else {
                warn!("Skipping entry with a non UTF-8 name {:?}", entry.path());
                continue;
            };
            let child_name = Name::new(file_name)?;
            if let Some(child) = self.load(entry.path(), child_name, entry.file_type())? {
                directory = directory.add(child);
            }
        }

        debug!("Loaded directory {:?} with {} entries", path, directory.len());
        Ok(directory)
    }
}

fn write_node(parent: &Path, node: &FileNode) -> Result<()> {
    let path = parent.join(node.name().as_str());
    match node {
        FileNode::File(file) => {
            let written = write_chunks_atomically(&path, file.content().chunks())?;
            debug!("Wrote {:?} ({} bytes)", path, written);
        }
        FileNode::Directory(directory) => {
            fs::create_dir_all(&path)?;
            for child in directory.iter() {
                write_node(&path, child)?;
            }
            debug!("Wrote directory {:?}", path);
        }
    }
    Ok(())
}
