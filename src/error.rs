//! Error types for secure deletion.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file system step that failed while erasing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IoOp {
    Stat,
    Open,
    Seek,
    Write,
    Flush,
    Sync,
    Verify,
    RemoveFile,
    RemoveDir,
    ReadDir,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoOp::Stat => "stat",
            IoOp::Open => "open",
            IoOp::Seek => "seek",
            IoOp::Write => "write",
            IoOp::Flush => "flush",
            IoOp::Sync => "sync",
            IoOp::Verify => "verify",
            IoOp::RemoveFile => "remove file",
            IoOp::RemoveDir => "remove directory",
            IoOp::ReadDir => "read directory",
        };
        f.write_str(s)
    }
}

/// Errors produced while erasing a file or a directory tree.
#[derive(Error, Debug)]
pub enum EraseError {
    /// Target path was absent when the operation reached it.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A file operation was requested on something that is not a regular file.
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// A tree operation was requested on something that is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A write, flush, sync, unlink or directory removal failed.
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Pass count below one.
    #[error("invalid pass count {0}: at least one pass is required")]
    InvalidPasses(u32),

    /// The parallel worker pool could not be started.
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

/// Convenience alias for erasure results.
pub type Result<T> = std::result::Result<T, EraseError>;

impl EraseError {
    pub fn io(op: IoOp, path: &Path, source: io::Error) -> Self {
        EraseError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Map a stat failure, folding `ENOENT` into [`EraseError::NotFound`].
    pub fn from_stat(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            EraseError::NotFound(path.to_path_buf())
        } else {
            EraseError::io(IoOp::Stat, path, source)
        }
    }

    /// Short machine-readable tag, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EraseError::NotFound(_) => "not-found",
            EraseError::NotAFile(_) => "not-a-file",
            EraseError::NotADirectory(_) => "not-a-directory",
            EraseError::Io { .. } => "io-failure",
            EraseError::InvalidPasses(_) => "invalid-passes",
            EraseError::WorkerPool(_) => "worker-pool",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EraseError::NotFound(_))
    }

    /// The failing step, for I/O failures.
    pub fn io_op(&self) -> Option<IoOp> {
        match self {
            EraseError::Io { op, .. } => Some(*op),
            _ => None,
        }
    }
}
