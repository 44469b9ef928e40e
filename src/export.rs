//! Export of assignments as Word documents.
//!
//! Exporting runs in three stages:
//!
//! 1. [`transform`] turns each page's markup into styled paragraphs.
//! 2. [`layout`] arranges the cover page and the body into a [`Document`].
//! 3. [`docx`] serializes the document as an Office Open XML package.
//!
//! [`Document`]: document::Document

use crate::domain::{Assignment, Config};

pub mod document;
pub mod docx;
pub mod layout;
pub mod transform;

/// An error writing an export package.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The ZIP container could not be written.
    #[error("failed to write document package: {0}")]
    Package(#[from] zip::result::ZipError),

    /// A part could not be written into the container.
    #[error("failed to write document part: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Suggested file name, derived from the assignment title.
    pub file_name: String,
    /// The `.docx` package.
    pub bytes: Vec<u8>,
}

/// Export `assignment` as a `.docx` document.
///
/// Cover fields left empty are filled from `config`. Content that cannot be
/// represented (undecodable pictures, tables inside pages) is skipped rather
/// than failing the export.
///
/// # Errors
///
/// Returns an [`ExportError`] if the package cannot be written.
pub fn export(assignment: &Assignment, config: &Config) -> Result<Export, ExportError> {
    let document = layout::layout(assignment, config);
    let bytes = docx::write(&document)?;
    let file_name = layout::file_name(assignment.name());

    tracing::info!(
        id = assignment.id(),
        pages = assignment.page_count(),
        images = document.images().count(),
        size = bytes.len(),
        "exported {file_name}"
    );

    Ok(Export { file_name, bytes })
}
