//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract the note façade depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Writes report affected row counts; callers decide what zero means.

pub mod note_repo;
