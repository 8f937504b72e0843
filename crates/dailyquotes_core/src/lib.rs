//! Core logic for the daily quotes client: local notes, the paged quote
//! feed and the periodic quote notifier.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod exec;
pub mod feed;
pub mod logging;
pub mod model;
pub mod notifier;
pub mod repo;
pub mod service;
pub mod settings;

pub use api::{QuotesApiClient, QuotesApiConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use exec::{MainHandle, MainLoop, SerialWorker, WorkerError};
pub use feed::driver::QuoteFeed;
pub use feed::paginator::{FeedError, PageOutcome, PaginatorConfig, QuotePaginator};
pub use feed::probe::{ConnectivityProbe, RouteProbe, StaticProbe};
pub use feed::source::{FetchFailure, PagedSource, RandomQuoteSource};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{validate_note_input, Note, NoteId, NoteValidationError};
pub use model::quote::{Quote, QuotePage};
pub use notifier::{DailyQuoteJob, JobOutcome, JobScheduler, Notification, NotificationSink};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_queue::NoteQueue;
pub use service::note_store::{NoteStore, NoteStoreError, NoteStoreResult};
pub use settings::{AppSettings, SettingsError, SettingsStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
