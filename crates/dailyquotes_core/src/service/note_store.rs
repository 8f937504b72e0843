//! Note CRUD façade.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list use-cases over a record store.
//! - Stamp `created_at`/`updated_at` from the caller-supplied clock.
//!
//! # Invariants
//! - Input emptiness is validated by callers (`validate_note_input`), not here.
//! - `update` on a missing id fails with `NotFound` and writes nothing.
//! - `delete` is unconditional and idempotent.
//! - Every call re-reads storage; there is no cache.

use crate::clock::Clock;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Failure of a note store operation.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Target note does not exist.
    NotFound(NoteId),
    /// Underlying persistence failure; the single operation is abandoned.
    Store(RepoError),
    /// Write succeeded but the read-back disagrees.
    InconsistentState(&'static str),
}

impl NoteStoreError {
    /// Short message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Note no longer exists".to_string(),
            Self::Store(err) => format!("Could not save note: {err}"),
            Self::InconsistentState(_) => "Note storage is in an unexpected state".to_string(),
        }
    }
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteStoreError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Note façade over a record store implementation.
pub struct NoteStore<R: NoteRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: NoteRepository> NoteStore<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Creates and persists a note; returns the stored record.
    pub fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> NoteStoreResult<Note> {
        let note = Note::new(title, description, self.clock.timestamp());
        let id = self.repo.insert(&note).inspect_err(|err| {
            error!("event=note_create module=service status=error error={err}");
        })?;
        info!("event=note_create module=service status=ok note_id={id}");

        self.repo
            .get_by_id(&id)?
            .ok_or(NoteStoreError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Replaces title and description of an existing note.
    pub fn update(
        &self,
        id: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> NoteStoreResult<Note> {
        let Some(mut note) = self.repo.get_by_id(id)? else {
            info!("event=note_update module=service status=not_found note_id={id}");
            return Err(NoteStoreError::NotFound(id.to_string()));
        };

        note.apply_edit(title, description, self.clock.timestamp());
        // Keep `updated_at >= created_at` even if the clock went backwards.
        if note.updated_at < note.created_at {
            note.updated_at = note.created_at.clone();
        }

        if self.repo.update(&note)? == 0 {
            return Err(NoteStoreError::NotFound(note.id));
        }
        info!("event=note_update module=service status=ok note_id={id}");
        Ok(note)
    }

    /// Deletes by id. Missing ids are not an error.
    pub fn delete(&self, id: &str) -> NoteStoreResult<()> {
        let removed = self.repo.delete_by_id(id)?;
        info!("event=note_delete module=service status=ok note_id={id} removed={removed}");
        Ok(())
    }

    pub fn get(&self, id: &str) -> NoteStoreResult<Option<Note>> {
        Ok(self.repo.get_by_id(id)?)
    }

    /// All notes, newest first.
    pub fn list(&self) -> NoteStoreResult<Vec<Note>> {
        Ok(self.repo.list_all_ordered_by_created_desc()?)
    }

    pub fn count(&self) -> NoteStoreResult<usize> {
        Ok(self.repo.count()?)
    }

    /// Deletes every note; returns how many were removed.
    pub fn clear(&self) -> NoteStoreResult<usize> {
        let removed = self.repo.delete_all()?;
        info!("event=note_clear module=service status=ok removed={removed}");
        Ok(removed)
    }
}
