//! A file-backed collection of assignments.
//!
//! The [`Store`] keeps every assignment in a single JSON array under the
//! repository root. The whole collection is rewritten on every change, and the
//! last write wins.

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    domain::{Assignment, credential::CredentialVerifier},
    storage::AssignmentRecord,
};

/// The store file's name within the repository root.
pub const FILE_NAME: &str = "assignments.json";

/// Errors raised while persisting the collection.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The collection could not be serialized.
    #[error("failed to serialize assignments: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The store file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Errors raised by a confirmed deletion.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// The confirmation password was rejected.
    #[error("incorrect password")]
    IncorrectPassword,

    /// The collection could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The persisted collection of assignments.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    assignments: Vec<Assignment>,
}

impl Store {
    /// Open the store under `root`.
    ///
    /// A missing or unreadable store file yields an empty collection; the
    /// failure is logged rather than returned.
    #[must_use]
    pub fn open(root: &Path) -> Self {
        let path = root.join(FILE_NAME);
        let assignments = load(&path).unwrap_or_else(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                tracing::debug!("no store at {}; starting empty", path.display());
            } else {
                tracing::warn!("failed to load assignments from {}: {e}", path.display());
            }
            Vec::new()
        });

        Self { path, assignments }
    }

    /// The store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every assignment, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Assignment] {
        &self.assignments
    }

    /// The assignment with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id() == id)
    }

    /// The single assignment whose id starts with `prefix`.
    ///
    /// An exact match always wins. Returns `None` if no id, or more than one
    /// id, starts with `prefix`.
    #[must_use]
    pub fn find(&self, prefix: &str) -> Option<&Assignment> {
        if let Some(exact) = self.get(prefix) {
            return Some(exact);
        }
        let mut matches = self.assignments.iter().filter(|a| a.id().starts_with(prefix));
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    /// Insert `assignment`, replacing any existing assignment with the same id,
    /// and persist the collection.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the collection cannot be written. The
    /// collection in memory is then left as it was.
    pub fn save(&mut self, assignment: Assignment) -> Result<(), StoreError> {
        tracing::info!("saving assignment {} ({})", assignment.id(), assignment.name());
        let mut assignments = self.assignments.clone();
        match assignments.iter_mut().find(|a| a.id() == assignment.id()) {
            Some(existing) => *existing = assignment,
            None => assignments.push(assignment),
        }
        self.commit(assignments)
    }

    /// Remove the assignment with the given id and persist the collection.
    ///
    /// Returns whether an assignment was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the collection cannot be written.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut assignments = self.assignments.clone();
        assignments.retain(|a| a.id() != id);
        let removed = assignments.len() != self.assignments.len();
        self.commit(assignments)?;
        if removed {
            tracing::info!("deleted assignment {id}");
        }
        Ok(removed)
    }

    /// Remove the assignment with the given id once `password` is confirmed by
    /// `verifier`.
    ///
    /// Returns whether an assignment was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteError::IncorrectPassword`], leaving the collection
    /// untouched, if the password is rejected, or [`DeleteError::Store`] if
    /// the collection cannot be written.
    pub fn delete_confirmed(
        &mut self,
        id: &str,
        password: &str,
        verifier: &impl CredentialVerifier,
    ) -> Result<bool, DeleteError> {
        if !verifier.confirm(password) {
            tracing::debug!("refusing to delete {id}: password rejected");
            return Err(DeleteError::IncorrectPassword);
        }
        Ok(self.delete(id)?)
    }

    /// Write `assignments` to disk, then adopt them as the collection.
    fn commit(&mut self, assignments: Vec<Assignment>) -> Result<(), StoreError> {
        let records: Vec<AssignmentRecord> =
            assignments.iter().cloned().map(Into::into).collect();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.assignments = assignments;
        Ok(())
    }
}

fn load(path: &Path) -> io::Result<Vec<Assignment>> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<AssignmentRecord> = serde_json::from_str(&content)?;
    Ok(records.into_iter().map(Into::into).collect())
}
