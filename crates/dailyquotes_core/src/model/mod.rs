//! Domain model for notes and remote quotes.
//!
//! # Responsibility
//! - Define the canonical `Note` record owned by the local store.
//! - Define the `Quote` value object and the remote page envelope.
//!
//! # Invariants
//! - Every note is identified by an immutable opaque string id.
//! - Quotes are value objects and are never persisted.

pub mod note;
pub mod quote;
