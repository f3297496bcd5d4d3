use super::{MetadataStripper, StripError};
use lopdf::{Document, Object, ObjectId};
use std::fs;
use std::path::Path;

/// Drops the document information dictionary and every XMP `/Metadata`
/// stream hanging off the catalog or a page. Page content is untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfStripper;

impl MetadataStripper for PdfStripper {
    fn strip(&self, input: &Path, output: &Path) -> Result<(), StripError> {
        let bytes = fs::read(input).map_err(|e| StripError::io(input, e))?;
        let cleaned = strip_pdf(&bytes)?;
        fs::write(output, cleaned).map_err(|e| StripError::io(output, e))
    }
}

pub fn strip_pdf(bytes: &[u8]) -> Result<Vec<u8>, StripError> {
    let mut doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        return Err(StripError::malformed("pdf", "encrypted documents are not supported"));
    }

    doc.trailer.remove(b"Info");

    let root = doc.trailer.get(b"Root").and_then(Object::as_reference)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for id in std::iter::once(root).chain(pages) {
        if let Ok(dict) = doc.get_object_mut(id).and_then(Object::as_dict_mut) {
            dict.remove(b"Metadata");
        }
    }

    // Detached info and XMP objects would otherwise still be written out.
    doc.prune_objects();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| StripError::malformed("pdf", format!("cannot write document: {e}")))?;
    Ok(out)
}
