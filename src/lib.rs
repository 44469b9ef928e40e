//! Compose university assignments and export them as Word documents.
//!
//! An assignment is a cover page plus one or more pages of rich markup. The
//! crate provides the page model and its editing operations, word completion
//! for the page editor, a `.docx` exporter, a JSON record store and a small
//! scientific calculator.

pub mod domain;
pub use domain::{Assignment, AssignmentDraft, Config, Cover, CoverRow, PageError};

pub mod export;
pub use export::{Export, ExportError};

/// Persistence of assignments as a JSON record collection.
pub mod storage;
pub use storage::{Store, StoreError};
