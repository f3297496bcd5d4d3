//! File system seam used by the shredder and the tree eraser.
//!
//! Production code goes through [`LocalDisk`]. Tests substitute stubs that
//! record call order or inject failures for specific paths.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// What kind of node a path names, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Metadata captured once per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub len: u64,
}

/// An open file handle that can be overwritten in place and forced to disk.
pub trait StorageFile: Read + Write + Seek {
    /// Force written data to durable storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl StorageFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

pub trait Storage: Sync {
    type File: StorageFile;

    fn stat(&self, path: &Path) -> io::Result<NodeInfo>;

    /// Open an existing file for in-place writing. Must not create or truncate.
    /// Read access is requested only when `read_back` is set.
    fn open_for_overwrite(&self, path: &Path, read_back: bool) -> io::Result<Self::File>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDisk;

impl Storage for LocalDisk {
    type File = File;

    fn stat(&self, path: &Path) -> io::Result<NodeInfo> {
        let meta = fs::symlink_metadata(path)?;
        let ft = meta.file_type();
        let kind = if ft.is_file() {
            NodeKind::File
        } else if ft.is_dir() {
            NodeKind::Dir
        } else if ft.is_symlink() {
            NodeKind::Symlink
        } else {
            NodeKind::Other
        };
        Ok(NodeInfo {
            kind,
            len: meta.len(),
        })
    }

    fn open_for_overwrite(&self, path: &Path, read_back: bool) -> io::Result<File> {
        let mut opts = OpenOptions::new();
        opts.read(read_back).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.custom_flags(libc::O_NOFOLLOW);
        }
        opts.open(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}
