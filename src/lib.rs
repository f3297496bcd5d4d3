//! # privacytool
//!
//! Secure deletion of files and directory trees, plus metadata removal for
//! images, PDFs and audio.
//!
//! Files are overwritten in place with random data for a configurable number
//! of passes, each pass synced to disk before the next begins, then unlinked.
//! Directory trees are processed in post-order so a directory is removed only
//! after everything beneath it.
//!
//! Overwriting is best effort: wear-levelled SSDs, journaling and
//! copy-on-write file systems, and snapshots may keep older copies of the
//! data that no in-place write can reach.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod output;
pub mod progress;
pub mod report;
pub mod shredder;
pub mod storage;
pub mod tree;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use cancel::CancelToken;
pub use config::{EraseOptions, Passes, DEFAULT_PASSES};
pub use error::{EraseError, IoOp, Result};
pub use metadata::{FormatCategory, FormatTable, MetadataDispatcher, MetadataStripper, StripError};
pub use progress::EraseEvent;
pub use report::{Action, ErasureReport, Outcome};
pub use shredder::Overwriter;
pub use storage::{LocalDisk, Storage, StorageFile};
pub use tree::TreeEraser;

use std::path::Path;

/// Securely erase a single file on the local disk.
pub fn erase_file(path: &Path, options: &EraseOptions) -> Result<()> {
    Overwriter::local(options.clone()).erase(path)
}

/// Securely erase a directory tree on the local disk.
pub fn erase_tree(root: &Path, options: &EraseOptions) -> Result<ErasureReport> {
    TreeEraser::local(options.clone()).erase_tree(root)
}
