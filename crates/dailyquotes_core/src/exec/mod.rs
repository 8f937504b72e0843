//! Background execution and presentation hand-off.
//!
//! # Responsibility
//! - Run blocking work (SQLite) on one dedicated worker thread, strictly FIFO.
//! - Deliver completions back to the presentation side explicitly, through a
//!   [`MainHandle`] drained by the owner of the [`MainLoop`].
//!
//! # Invariants
//! - Jobs submitted to one `SerialWorker` never interleave.
//! - Worker state is created and dropped on the worker thread.
//! - Completion callbacks run only when the presentation side drains them.

mod main_loop;
mod serial_worker;

pub use main_loop::{MainHandle, MainLoop, MainTask};
pub use serial_worker::{SerialWorker, WorkerError};
