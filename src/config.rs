use crate::error::{EraseError, Result};
use std::fmt;

/// Passes used when the caller does not ask for a specific count.
pub const DEFAULT_PASSES: u32 = 3;

/// Number of overwrite passes. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passes(u32);

impl Passes {
    pub fn new(n: u32) -> Result<Self> {
        if n == 0 {
            return Err(EraseError::InvalidPasses(n));
        }
        Ok(Self(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Passes {
    fn default() -> Self {
        Self(DEFAULT_PASSES)
    }
}

impl fmt::Display for Passes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings for one erase invocation.
#[derive(Debug, Clone, Default)]
pub struct EraseOptions {
    /// Overwrite passes per file.
    pub passes: Passes,
    /// Deliver progress events to the caller's sink.
    pub verbose: bool,
    /// Read each pass back and compare digests after it is synced.
    pub verify: bool,
    /// Worker threads for tree erasure. `None` or `Some(1)` walks sequentially.
    pub jobs: Option<usize>,
}

impl EraseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passes(mut self, passes: Passes) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    /// True when tree erasure should fan out over a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.jobs.is_some_and(|j| j > 1)
    }
}
