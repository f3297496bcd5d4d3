//! Metadata stripping for images, PDFs and audio.
//!
//! A [`MetadataDispatcher`] maps a file extension to a [`FormatCategory`]
//! through an immutable [`FormatTable`] and hands the file to the
//! [`MetadataStripper`] registered for that category.

pub mod audio;
pub mod pdf;
pub mod raster;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCategory {
    Image,
    Pdf,
    Audio,
}

impl FormatCategory {
    pub fn label(self) -> &'static str {
        match self {
            FormatCategory::Image => "Images",
            FormatCategory::Pdf => "Pdfs",
            FormatCategory::Audio => "Audio",
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatCategory::Image => "image",
            FormatCategory::Pdf => "pdf",
            FormatCategory::Audio => "audio",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum StripError {
    #[error("unsupported file type: {ext:?}")]
    UnsupportedFormat { ext: String },

    #[error("no metadata backend registered for {0} files")]
    NoBackend(FormatCategory),

    #[error("malformed {format} file: {reason}")]
    Malformed { format: &'static str, reason: String },

    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),

    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StripError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        StripError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        StripError::Malformed {
            format,
            reason: reason.into(),
        }
    }
}

/// Removes embedded metadata from one kind of file.
pub trait MetadataStripper: Send + Sync {
    /// Read `input` and write a metadata-free copy to `output`.
    /// `output` may equal `input`.
    fn strip(&self, input: &Path, output: &Path) -> Result<(), StripError>;
}

/// Extension -> category mapping. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct FormatTable {
    categories: Vec<(FormatCategory, Vec<String>)>,
}

impl FormatTable {
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Add extensions for `category`. Extensions are matched case-insensitively,
    /// with or without a leading dot.
    pub fn with_category(mut self, category: FormatCategory, extensions: &[&str]) -> Self {
        let normalized = extensions.iter().map(|e| normalize_ext(e));
        match self.categories.iter_mut().find(|(c, _)| *c == category) {
            Some((_, exts)) => exts.extend(normalized),
            None => self.categories.push((category, normalized.collect())),
        }
        self
    }

    pub fn categorize(&self, path: &Path) -> Result<FormatCategory, StripError> {
        let ext = path
            .extension()
            .map(|e| normalize_ext(&e.to_string_lossy()))
            .unwrap_or_default();
        self.categories
            .iter()
            .find(|(_, exts)| exts.iter().any(|e| *e == ext))
            .map(|(c, _)| *c)
            .ok_or(StripError::UnsupportedFormat { ext })
    }

    pub fn categories(&self) -> impl Iterator<Item = (FormatCategory, &[String])> {
        self.categories.iter().map(|(c, exts)| (*c, exts.as_slice()))
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flat_map(|(_, exts)| exts.iter().map(String::as_str))
            .collect()
    }
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::empty()
            .with_category(FormatCategory::Image, &[".jpg", ".jpeg", ".png"])
            .with_category(FormatCategory::Pdf, &[".pdf"])
            .with_category(FormatCategory::Audio, &[".mp3", ".flac", ".wav"])
    }
}

fn normalize_ext(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

/// Routes files to the stripper registered for their category.
pub struct MetadataDispatcher {
    table: FormatTable,
    backends: HashMap<FormatCategory, Box<dyn MetadataStripper>>,
}

impl MetadataDispatcher {
    /// A dispatcher with no backends registered.
    pub fn new(table: FormatTable) -> Self {
        Self {
            table,
            backends: HashMap::new(),
        }
    }

    /// Image, PDF and audio backends.
    pub fn with_default_backends(table: FormatTable) -> Self {
        Self::new(table)
            .with_backend(FormatCategory::Image, raster::ImageStripper::default())
            .with_backend(FormatCategory::Pdf, pdf::PdfStripper)
            .with_backend(FormatCategory::Audio, audio::AudioStripper)
    }

    pub fn with_backend(
        mut self,
        category: FormatCategory,
        backend: impl MetadataStripper + 'static,
    ) -> Self {
        self.backends.insert(category, Box::new(backend));
        self
    }

    pub fn table(&self) -> &FormatTable {
        &self.table
    }

    /// Strip metadata from `path`, writing to `output` or in place.
    /// Returns the path written.
    pub fn strip_metadata(&self, path: &Path, output: Option<&Path>) -> Result<PathBuf, StripError> {
        let category = self.table.categorize(path)?;
        let backend = self
            .backends
            .get(&category)
            .ok_or(StripError::NoBackend(category))?;
        let output = output.unwrap_or(path);
        backend.strip(path, output)?;
        info!(input = %path.display(), output = %output.display(), %category, "metadata removed");
        Ok(output.to_path_buf())
    }
}

impl Default for MetadataDispatcher {
    fn default() -> Self {
        Self::with_default_backends(FormatTable::default())
    }
}
