//! Multi-pass overwrite of a single file, followed by unlink.

use crate::config::EraseOptions;
use crate::error::{EraseError, IoOp, Result};
use crate::progress::{self, EraseEvent, ProgressSink};
use crate::storage::{LocalDisk, NodeKind, Storage, StorageFile};
use rand::RngCore;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 65536;

/// Overwrites files in place with random data, syncing after every pass,
/// then deletes them.
pub struct Overwriter<S = LocalDisk> {
    storage: S,
    options: EraseOptions,
}

impl Overwriter<LocalDisk> {
    pub fn local(options: EraseOptions) -> Self {
        Self::new(LocalDisk, options)
    }
}

impl<S: Storage> Overwriter<S> {
    pub fn new(storage: S, options: EraseOptions) -> Self {
        Self { storage, options }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn options(&self) -> &EraseOptions {
        &self.options
    }

    /// Securely erase one regular file.
    pub fn erase(&self, path: &Path) -> Result<()> {
        self.erase_with(path, &progress::silent).map(|_| ())
    }

    /// Like [`Overwriter::erase`], reporting progress to `sink` when verbose.
    /// Returns the length of the overwritten range.
    pub fn erase_with(&self, path: &Path, sink: ProgressSink<'_>) -> Result<u64> {
        let result = self.shred(path, sink);
        if let Err(ref error) = result {
            warn!(path = %path.display(), %error, "file erase failed");
            self.emit(sink, EraseEvent::Failed { path, error });
        }
        result
    }

    fn shred(&self, path: &Path, sink: ProgressSink<'_>) -> Result<u64> {
        // The length is read exactly once; every pass overwrites this range.
        let info = self
            .storage
            .stat(path)
            .map_err(|e| EraseError::from_stat(path, e))?;
        if info.kind != NodeKind::File {
            return Err(EraseError::NotAFile(path.to_path_buf()));
        }
        let len = info.len;
        let passes = self.options.passes.get();

        self.emit(sink, EraseEvent::FileStarted { path, len, passes });
        debug!(path = %path.display(), len, passes, "shredding file");

        let mut file = self
            .storage
            .open_for_overwrite(path, self.options.verify)
            .map_err(|e| EraseError::io(IoOp::Open, path, e))?;
        self.overwrite(&mut file, path, len, sink)?;
        drop(file);

        self.storage
            .remove_file(path)
            .map_err(|e| EraseError::io(IoOp::RemoveFile, path, e))?;

        self.emit(sink, EraseEvent::FileErased { path });
        debug!(path = %path.display(), "file erased");
        Ok(len)
    }

    fn overwrite(
        &self,
        file: &mut S::File,
        path: &Path,
        len: u64,
        sink: ProgressSink<'_>,
    ) -> Result<()> {
        let passes = self.options.passes.get();
        let buf_len = usize::try_from(len).map_or(CHUNK_SIZE, |l| l.min(CHUNK_SIZE));
        let mut buf = vec![0u8; buf_len];
        let mut rng = rand::thread_rng();

        for pass in 1..=passes {
            self.emit(sink, EraseEvent::Pass { path, pass, passes });
            debug!(path = %path.display(), pass, passes, "overwrite pass");

            file.seek(SeekFrom::Start(0))
                .map_err(|e| EraseError::io(IoOp::Seek, path, e))?;

            let mut hasher = self.options.verify.then(blake3::Hasher::new);
            let mut remaining = len;
            while remaining > 0 {
                let chunk = remaining.min(buf.len() as u64) as usize;
                rng.fill_bytes(&mut buf[..chunk]);
                file.write_all(&buf[..chunk])
                    .map_err(|e| EraseError::io(IoOp::Write, path, e))?;
                if let Some(h) = hasher.as_mut() {
                    h.update(&buf[..chunk]);
                }
                remaining -= chunk as u64;
            }

            // A pass is done only once it is durable.
            file.flush()
                .map_err(|e| EraseError::io(IoOp::Flush, path, e))?;
            file.sync()
                .map_err(|e| EraseError::io(IoOp::Sync, path, e))?;

            if let Some(h) = hasher {
                verify_pass(file, path, len, &h.finalize(), &mut buf)?;
            }
        }
        Ok(())
    }

    fn emit(&self, sink: ProgressSink<'_>, event: EraseEvent<'_>) {
        if self.options.verbose {
            sink(&event);
        }
    }
}

fn verify_pass<F: StorageFile>(
    file: &mut F,
    path: &Path,
    len: u64,
    expected: &blake3::Hash,
    buf: &mut [u8],
) -> Result<()> {
    let verify_err = |e: io::Error| EraseError::io(IoOp::Verify, path, e);

    file.seek(SeekFrom::Start(0)).map_err(verify_err)?;
    let mut hasher = blake3::Hasher::new();
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        file.read_exact(&mut buf[..chunk]).map_err(verify_err)?;
        hasher.update(&buf[..chunk]);
        remaining -= chunk as u64;
    }

    if hasher.finalize() != *expected {
        return Err(verify_err(io::Error::new(
            io::ErrorKind::InvalidData,
            "read-back digest does not match written data",
        )));
    }
    Ok(())
}
