//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Schedule note use-cases on the background worker for UI callers.

pub mod note_queue;
pub mod note_store;
