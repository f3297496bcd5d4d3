use crate::error::EraseError;
use std::path::Path;

/// Observational events emitted while erasing. They never gate correctness.
#[derive(Debug)]
pub enum EraseEvent<'a> {
    FileStarted {
        path: &'a Path,
        len: u64,
        passes: u32,
    },
    Pass {
        path: &'a Path,
        pass: u32,
        passes: u32,
    },
    FileErased {
        path: &'a Path,
    },
    Unlinked {
        path: &'a Path,
    },
    DirStarted {
        path: &'a Path,
    },
    DirRemoved {
        path: &'a Path,
    },
    Failed {
        path: &'a Path,
        error: &'a EraseError,
    },
}

/// Receives progress events. Shared across workers when erasing in parallel.
pub type ProgressSink<'s> = &'s (dyn Fn(&EraseEvent<'_>) + Sync);

/// A sink that drops every event.
pub fn silent(_: &EraseEvent<'_>) {}
