use crate::error::EraseError;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What was done to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Overwritten with random passes, then unlinked.
    EraseFile,
    /// Symlink or special file removed without overwriting.
    Unlink,
    /// Empty directory removed.
    RemoveDir,
    /// Directory contents could not be listed.
    ListDir,
}

/// Result for one visited node.
#[derive(Debug)]
pub struct Outcome {
    pub path: PathBuf,
    pub action: Action,
    /// Length of the overwritten range. Zero for directories and links.
    pub bytes: u64,
    pub error: Option<EraseError>,
}

impl Outcome {
    pub fn ok(path: &Path, action: Action, bytes: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            bytes,
            error: None,
        }
    }

    pub fn failed(path: &Path, action: Action, error: EraseError) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            bytes: 0,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Outcome", 7)?;
        s.serialize_field("path", &self.path.display().to_string())?;
        s.serialize_field("action", &self.action)?;
        s.serialize_field("succeeded", &self.succeeded())?;
        s.serialize_field("bytes", &self.bytes)?;
        s.serialize_field("error_kind", &self.error.as_ref().map(EraseError::kind))?;
        s.serialize_field("op", &self.error.as_ref().and_then(EraseError::io_op))?;
        s.serialize_field("reason", &self.error.as_ref().map(ToString::to_string))?;
        s.end()
    }
}

/// Ordered log of per-node outcomes from one erase invocation.
///
/// For tree erasure, every descendant of a directory appears before that
/// directory's own `RemoveDir` outcome.
#[derive(Debug, Default, serde::Serialize)]
pub struct ErasureReport {
    outcomes: Vec<Outcome>,
    cancelled: bool,
}

impl ErasureReport {
    /// Report for a single-file erase.
    pub fn single(path: &Path, result: crate::Result<u64>) -> Self {
        let outcome = match result {
            Ok(bytes) => Outcome::ok(path, Action::EraseFile, bytes),
            Err(e) => Outcome::failed(path, Action::EraseFile, e),
        };
        Self {
            outcomes: vec![outcome],
            cancelled: false,
        }
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True if the run was stopped before every node was visited.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every node succeeded and the run was not cancelled.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(Outcome::succeeded)
    }

    /// Sum of the overwritten ranges of successfully erased files.
    pub fn bytes_erased(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.bytes)
            .sum()
    }

    pub fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}

/// Append-only collector shared by tree workers.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    outcomes: Mutex<Vec<Outcome>>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(outcome);
    }

    pub fn finish(self, cancelled: bool) -> ErasureReport {
        ErasureReport {
            outcomes: self
                .outcomes
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            cancelled,
        }
    }
}
