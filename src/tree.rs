//! Post-order erasure of a directory tree.
//!
//! Every file is shredded and every directory is removed only after all of
//! its descendants have been processed. A failure on one node is recorded in
//! the report and never stops the walk; only a bad root aborts up front.

use crate::cancel::CancelToken;
use crate::config::EraseOptions;
use crate::error::{EraseError, IoOp, Result};
use crate::progress::{self, EraseEvent, ProgressSink};
use crate::report::{Action, ErasureReport, Outcome, ReportBuilder};
use crate::shredder::Overwriter;
use crate::storage::{LocalDisk, NodeKind, Storage};
use rayon::prelude::*;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Erases a directory and everything beneath it.
///
/// Directory contents are listed from the real file system; every mutation
/// goes through the [`Storage`] the eraser was built with.
pub struct TreeEraser<S = LocalDisk> {
    shredder: Overwriter<S>,
    cancel: CancelToken,
}

impl TreeEraser<LocalDisk> {
    pub fn local(options: EraseOptions) -> Self {
        Self::new(LocalDisk, options)
    }
}

impl<S: Storage> TreeEraser<S> {
    pub fn new(storage: S, options: EraseOptions) -> Self {
        Self {
            shredder: Overwriter::new(storage, options),
            cancel: CancelToken::new(),
        }
    }

    /// Stop starting new nodes once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn storage(&self) -> &S {
        self.shredder.storage()
    }

    pub fn erase_tree(&self, root: &Path) -> Result<ErasureReport> {
        self.erase_tree_with(root, &progress::silent)
    }

    /// Erase `root` recursively, reporting progress to `sink` when verbose.
    ///
    /// Returns `Err` only when `root` is missing or is not a directory; in
    /// that case nothing has been touched.
    pub fn erase_tree_with(&self, root: &Path, sink: ProgressSink<'_>) -> Result<ErasureReport> {
        let info = self
            .storage()
            .stat(root)
            .map_err(|e| EraseError::from_stat(root, e))?;
        if info.kind != NodeKind::Dir {
            return Err(EraseError::NotADirectory(root.to_path_buf()));
        }

        let options = self.shredder.options();
        info!(
            root = %root.display(),
            passes = options.passes.get(),
            parallel = options.is_parallel(),
            "erasing directory tree"
        );
        self.emit(sink, EraseEvent::DirStarted { path: root });

        let report = if options.is_parallel() {
            self.erase_parallel(root, sink)?
        } else {
            self.erase_sequential(root, sink)
        };

        info!(
            root = %root.display(),
            entries = report.len(),
            failures = report.failure_count(),
            cancelled = report.cancelled(),
            "tree erase finished"
        );
        Ok(report)
    }

    fn erase_sequential(&self, root: &Path, sink: ProgressSink<'_>) -> ErasureReport {
        let builder = ReportBuilder::new();
        let mut cancelled = false;

        // contents_first yields every child before its parent, root last.
        let walker = WalkDir::new(root)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();
        for entry in walker {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            match entry {
                Ok(entry) => builder.push(self.visit(entry.path(), entry.file_type(), sink)),
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    builder.push(self.list_failure(&path, io::Error::from(err), sink));
                }
            }
        }

        builder.finish(cancelled)
    }

    fn erase_parallel(&self, root: &Path, sink: ProgressSink<'_>) -> Result<ErasureReport> {
        let jobs = self.shredder.options().jobs.unwrap_or(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| EraseError::WorkerPool(e.to_string()))?;

        let builder = ReportBuilder::new();
        pool.install(|| self.erase_dir_parallel(root, &builder, sink));
        Ok(builder.finish(self.cancel.is_cancelled()))
    }

    fn erase_dir_parallel(&self, dir: &Path, builder: &ReportBuilder, sink: ProgressSink<'_>) {
        let children: Vec<(PathBuf, FileType)> = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
                    Ok(child) => Some(child),
                    Err(e) => {
                        builder.push(self.list_failure(dir, e, sink));
                        None
                    }
                })
                .collect(),
            Err(e) => {
                builder.push(self.list_failure(dir, e, sink));
                Vec::new()
            }
        };

        children.par_iter().for_each(|(path, file_type)| {
            if self.cancel.is_cancelled() {
                return;
            }
            if file_type.is_dir() {
                self.erase_dir_parallel(path, builder, sink);
            } else {
                builder.push(self.visit(path, *file_type, sink));
            }
        });

        // Every child subtree has returned by now.
        if self.cancel.is_cancelled() {
            return;
        }
        builder.push(self.remove_dir(dir, sink));
    }

    fn visit(&self, path: &Path, file_type: FileType, sink: ProgressSink<'_>) -> Outcome {
        if file_type.is_dir() {
            self.remove_dir(path, sink)
        } else if file_type.is_file() {
            match self.shredder.erase_with(path, sink) {
                Ok(len) => Outcome::ok(path, Action::EraseFile, len),
                Err(e) => Outcome::failed(path, Action::EraseFile, e),
            }
        } else {
            self.unlink(path, sink)
        }
    }

    /// Symlinks and special files carry no data of their own; remove the
    /// node itself and never write through it.
    fn unlink(&self, path: &Path, sink: ProgressSink<'_>) -> Outcome {
        match self.storage().remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "unlinked");
                self.emit(sink, EraseEvent::Unlinked { path });
                Outcome::ok(path, Action::Unlink, 0)
            }
            Err(e) => self.failure(path, Action::Unlink, EraseError::io(IoOp::RemoveFile, path, e), sink),
        }
    }

    fn remove_dir(&self, path: &Path, sink: ProgressSink<'_>) -> Outcome {
        match self.storage().remove_dir(path) {
            Ok(()) => {
                debug!(path = %path.display(), "directory removed");
                self.emit(sink, EraseEvent::DirRemoved { path });
                Outcome::ok(path, Action::RemoveDir, 0)
            }
            Err(e) => self.failure(path, Action::RemoveDir, EraseError::io(IoOp::RemoveDir, path, e), sink),
        }
    }

    fn list_failure(&self, path: &Path, source: io::Error, sink: ProgressSink<'_>) -> Outcome {
        self.failure(path, Action::ListDir, EraseError::io(IoOp::ReadDir, path, source), sink)
    }

    fn failure(&self, path: &Path, action: Action, error: EraseError, sink: ProgressSink<'_>) -> Outcome {
        warn!(path = %path.display(), %error, "tree node failed");
        self.emit(sink, EraseEvent::Failed { path, error: &error });
        Outcome::failed(path, action, error)
    }

    fn emit(&self, sink: ProgressSink<'_>, event: EraseEvent<'_>) {
        if self.shredder.options().verbose {
            sink(&event);
        }
    }
}
