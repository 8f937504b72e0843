//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record persisted by the local store.
//! - Provide input validation used by callers before they reach the store.
//!
//! # Invariants
//! - `id` is generated once at creation and never reused or changed.
//! - `updated_at >= created_at` under string ordering; both use
//!   [`TIMESTAMP_FORMAT`], which is fixed-width and sortable.
//! - A freshly created note has `updated_at == created_at`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identifier (UUID v4 in text form for generated notes).
pub type NoteId = String;

/// Storage and display format for note timestamps (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rejected form input. Raised by callers, never by the store itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl NoteValidationError {
    /// Short message suitable for direct display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "Title is required",
            Self::EmptyDescription => "Description is required",
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::EmptyDescription => write!(f, "note description cannot be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Checks edit-form input before a create/update is scheduled.
///
/// Returns the trimmed `(title, description)` that callers must persist.
/// Whitespace-only values count as empty. Title is checked first.
pub fn validate_note_input(
    title: &str,
    description: &str,
) -> Result<(String, String), NoteValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(NoteValidationError::EmptyDescription);
    }
    Ok((title.to_string(), description.to_string()))
}

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Primary key.
    pub id: NoteId,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD HH:MM:SS`, set once.
    pub created_at: String,
    /// `YYYY-MM-DD HH:MM:SS`, refreshed on every edit.
    pub updated_at: String,
}

impl Note {
    /// Creates a note with a generated id, stamped with `now`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        now: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, description, now)
    }

    /// Creates a note with a caller-provided id.
    ///
    /// Used by imports and tests where identity already exists.
    pub fn with_id(
        id: impl Into<NoteId>,
        title: impl Into<String>,
        description: impl Into<String>,
        now: impl Into<String>,
    ) -> Self {
        let now = now.into();
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Replaces the editable fields and refreshes `updated_at`.
    pub fn apply_edit(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        now: impl Into<String>,
    ) {
        self.title = title.into();
        self.description = description.into();
        self.updated_at = now.into();
    }

    /// Checks timestamp shape and ordering.
    ///
    /// Returns a description of the first violation found.
    pub fn check_timestamps(&self) -> Result<(), String> {
        for (field, value) in [
            ("created_at", &self.created_at),
            ("updated_at", &self.updated_at),
        ] {
            if NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_err() {
                return Err(format!("{field} `{value}` is not `YYYY-MM-DD HH:MM:SS`"));
            }
        }
        if self.updated_at < self.created_at {
            return Err(format!(
                "updated_at `{}` is earlier than created_at `{}`",
                self.updated_at, self.created_at
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_note_input, Note, NoteValidationError};

    #[test]
    fn new_note_has_equal_timestamps_and_uuid_id() {
        let note = Note::new("title", "body", "2024-05-01 08:00:00");
        assert_eq!(note.created_at, note.updated_at);
        assert!(uuid::Uuid::parse_str(&note.id).is_ok());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Note::new("a", "a", "2024-05-01 08:00:00");
        let b = Note::new("a", "a", "2024-05-01 08:00:00");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn apply_edit_keeps_created_at() {
        let mut note = Note::new("title", "body", "2024-05-01 08:00:00");
        note.apply_edit("new title", "new body", "2024-05-02 09:30:00");
        assert_eq!(note.created_at, "2024-05-01 08:00:00");
        assert_eq!(note.updated_at, "2024-05-02 09:30:00");
        assert!(note.check_timestamps().is_ok());
    }

    #[test]
    fn check_timestamps_rejects_bad_format_and_order() {
        let mut note = Note::with_id("n1", "t", "d", "2024-05-01");
        assert!(note.check_timestamps().unwrap_err().contains("created_at"));

        note.created_at = "2024-05-02 00:00:00".to_string();
        note.updated_at = "2024-05-01 00:00:00".to_string();
        assert!(note.check_timestamps().unwrap_err().contains("earlier"));
    }

    #[test]
    fn validation_rejects_blank_fields_in_order() {
        assert_eq!(
            validate_note_input("  ", ""),
            Err(NoteValidationError::EmptyTitle)
        );
        assert_eq!(
            validate_note_input("title", "\n"),
            Err(NoteValidationError::EmptyDescription)
        );
        assert_eq!(
            validate_note_input("title", "body"),
            Ok(("title".to_string(), "body".to_string()))
        );
    }

    #[test]
    fn validation_returns_trimmed_text() {
        assert_eq!(
            validate_note_input("  Groceries \n", " milk "),
            Ok(("Groceries".to_string(), "milk".to_string()))
        );
        assert_eq!(
            validate_note_input("\ttwo words\t", "line one\nline two\n"),
            Ok(("two words".to_string(), "line one\nline two".to_string()))
        );
    }
}
