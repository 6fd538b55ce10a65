//! Input selection: the ordered list of PDFs the user intends to submit.
//!
//! Files are added one at a time (from CLI arguments or the upload prompt),
//! filtered to PDFs, and can be removed individually before submission. Only
//! what is left in the [`FileSelection`] at submit time is encoded and sent.

use crate::error::QuizError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Media type of every accepted document.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A user-selected file together with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub mime_type: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }
}

/// Determine the declared media type of a local file.
///
/// A file counts as a PDF when its extension is `.pdf` (any case) or its
/// first four bytes are the `%PDF` magic. Returns `Ok(None)` for anything
/// else.
pub fn detect_media_type(path: &Path) -> Result<Option<&'static str>, QuizError> {
    if !path.is_file() {
        return Err(QuizError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if by_extension {
        return Ok(Some(PDF_MIME_TYPE));
    }

    let mut magic = [0u8; 4];
    let has_magic = std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok()
        && &magic == b"%PDF";

    Ok(has_magic.then_some(PDF_MIME_TYPE))
}

/// The files currently queued for submission, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<SourceDocument>,
}

impl FileSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file if it is a PDF.
    ///
    /// Returns `Ok(false)` when the file exists but is not a PDF; it is
    /// skipped, as a file picker filtered to PDFs would.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<bool, QuizError> {
        let path = path.as_ref();
        match detect_media_type(path)? {
            Some(mime) => {
                debug!("Selected {} ({})", path.display(), mime);
                self.files.push(SourceDocument::new(path, mime));
                Ok(true)
            }
            None => {
                warn!("Skipping non-PDF file: {}", path.display());
                Ok(false)
            }
        }
    }

    /// Add an already-typed document. Non-PDF documents are skipped.
    pub fn push(&mut self, doc: SourceDocument) -> bool {
        if doc.is_pdf() {
            self.files.push(doc);
            true
        } else {
            warn!("Skipping {} with media type {}", doc.path.display(), doc.mime_type);
            false
        }
    }

    /// Remove the file at `index` (0-based).
    pub fn remove(&mut self, index: usize) -> Option<SourceDocument> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn files(&self) -> &[SourceDocument] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}
