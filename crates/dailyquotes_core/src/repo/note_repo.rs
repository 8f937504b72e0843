//! Note record-store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide primary-key CRUD plus the recency listing over `notes`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing order is `created_at DESC`, ties by insertion order (`rowid ASC`).
//! - Writes are autocommitted, so they are durable when the call returns.
//! - Rows failing `Note::check_timestamps` surface as `InvalidData`.

use crate::db::DbError;
use crate::model::note::{Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for note storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record-store contract consumed by the note façade.
pub trait NoteRepository {
    /// Inserts one note and returns its id.
    fn insert(&self, note: &Note) -> RepoResult<NoteId>;
    /// Overwrites title, description and timestamps of an existing row.
    fn update(&self, note: &Note) -> RepoResult<usize>;
    /// Deletes by primary key. Missing ids affect zero rows.
    fn delete_by_id(&self, id: &str) -> RepoResult<usize>;
    fn get_by_id(&self, id: &str) -> RepoResult<Option<Note>>;
    /// All notes, newest `created_at` first, ties in insertion order.
    fn list_all_ordered_by_created_desc(&self) -> RepoResult<Vec<Note>>;
    fn count(&self) -> RepoResult<usize>;
    /// Removes every note and returns the number of deleted rows.
    fn delete_all(&self) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert(&self, note: &Note) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (
                id,
                title,
                description,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.description.as_str(),
                note.created_at.as_str(),
                note.updated_at.as_str(),
            ],
        )?;

        Ok(note.id.clone())
    }

    fn update(&self, note: &Note) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?1,
                description = ?2,
                created_at = ?3,
                updated_at = ?4
             WHERE id = ?5;",
            params![
                note.title.as_str(),
                note.description.as_str(),
                note.created_at.as_str(),
                note.updated_at.as_str(),
                note.id.as_str(),
            ],
        )?;
        Ok(changed)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], read_note_row).optional()?;
        raw.map(checked_note).transpose()
    }

    fn list_all_ordered_by_created_desc(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} ORDER BY created_at DESC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(checked_note(read_note_row(row)?)?);
        }
        Ok(notes)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }

    fn delete_all(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM notes;", [])?)
    }
}

fn read_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn checked_note(note: Note) -> RepoResult<Note> {
    note.check_timestamps()
        .map_err(|details| RepoError::InvalidData(format!("note `{}`: {details}", note.id)))?;
    Ok(note)
}
