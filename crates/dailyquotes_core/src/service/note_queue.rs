//! Note use-cases scheduled on the shared background worker.
//!
//! # Responsibility
//! - Own the SQLite connection on one `SerialWorker` thread.
//! - Run `NoteStore` operations there and post results to the main loop.
//!
//! # Invariants
//! - All note operations, reads included, run in submission order.
//! - Results reach callers only through the `MainHandle` they passed in,
//!   or through the receiver returned by `submit`.

use crate::clock::Clock;
use crate::db::{open_db, open_db_in_memory};
use crate::exec::{MainHandle, SerialWorker, WorkerError};
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::SqliteNoteRepository;
use crate::service::note_store::{NoteStore, NoteStoreResult};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

const WORKER_NAME: &str = "notes-db";

/// Background façade over [`NoteStore`].
pub struct NoteQueue {
    worker: SerialWorker<Connection>,
    clock: Arc<dyn Clock>,
}

impl NoteQueue {
    /// Opens (and migrates) the database file on the worker thread.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, WorkerError> {
        let path = path.into();
        let worker = SerialWorker::spawn(WORKER_NAME, move || open_db(&path))?;
        Ok(Self { worker, clock })
    }

    /// Uses a private in-memory database.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self, WorkerError> {
        let worker = SerialWorker::spawn(WORKER_NAME, open_db_in_memory)?;
        Ok(Self { worker, clock })
    }

    /// Runs `job` against the store; `on_main` receives its result on the
    /// presentation side.
    pub fn execute<T, J, C>(&self, main: &MainHandle, job: J, on_main: C) -> Result<(), WorkerError>
    where
        T: Send + 'static,
        J: for<'c> FnOnce(&NoteStore<SqliteNoteRepository<'c>>) -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let clock = self.clock.clone();
        self.worker.execute(
            main,
            move |conn: &mut Connection| job(&NoteStore::new(SqliteNoteRepository::new(conn), clock)),
            on_main,
        )
    }

    /// Runs `job` against the store and returns a receiver for its result.
    pub fn submit<T, J>(&self, job: J) -> Result<oneshot::Receiver<T>, WorkerError>
    where
        T: Send + 'static,
        J: for<'c> FnOnce(&NoteStore<SqliteNoteRepository<'c>>) -> T + Send + 'static,
    {
        let clock = self.clock.clone();
        self.worker.submit(move |conn: &mut Connection| {
            job(&NoteStore::new(SqliteNoteRepository::new(conn), clock))
        })
    }

    pub fn create(
        &self,
        main: &MainHandle,
        title: impl Into<String>,
        description: impl Into<String>,
        on_done: impl FnOnce(NoteStoreResult<Note>) + Send + 'static,
    ) -> Result<(), WorkerError> {
        let (title, description) = (title.into(), description.into());
        self.execute(main, move |store| store.create(title, description), on_done)
    }

    pub fn update(
        &self,
        main: &MainHandle,
        id: impl Into<NoteId>,
        title: impl Into<String>,
        description: impl Into<String>,
        on_done: impl FnOnce(NoteStoreResult<Note>) + Send + 'static,
    ) -> Result<(), WorkerError> {
        let (id, title, description) = (id.into(), title.into(), description.into());
        self.execute(
            main,
            move |store| store.update(&id, title, description),
            on_done,
        )
    }

    pub fn delete(
        &self,
        main: &MainHandle,
        id: impl Into<NoteId>,
        on_done: impl FnOnce(NoteStoreResult<()>) + Send + 'static,
    ) -> Result<(), WorkerError> {
        let id = id.into();
        self.execute(main, move |store| store.delete(&id), on_done)
    }

    pub fn get(
        &self,
        main: &MainHandle,
        id: impl Into<NoteId>,
        on_done: impl FnOnce(NoteStoreResult<Option<Note>>) + Send + 'static,
    ) -> Result<(), WorkerError> {
        let id = id.into();
        self.execute(main, move |store| store.get(&id), on_done)
    }

    pub fn list(
        &self,
        main: &MainHandle,
        on_done: impl FnOnce(NoteStoreResult<Vec<Note>>) + Send + 'static,
    ) -> Result<(), WorkerError> {
        self.execute(main, |store| store.list(), on_done)
    }

    /// Drains queued jobs and stops the worker.
    pub fn shutdown(self) {
        self.worker.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::NoteQueue;
    use crate::clock::ManualClock;
    use crate::exec::MainLoop;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn results_arrive_on_main_in_submission_order() {
        let clock = Arc::new(ManualClock::at("2024-06-01 12:00:00").unwrap());
        let queue = NoteQueue::in_memory(clock).unwrap();
        let main = MainLoop::new();
        let events = Arc::new(Mutex::new(Vec::new()));

        let log = events.clone();
        queue
            .create(&main.handle(), "first", "one", move |result| {
                log.lock().unwrap().push(format!("create:{}", result.unwrap().title));
            })
            .unwrap();
        let log = events.clone();
        queue
            .list(&main.handle(), move |result| {
                log.lock().unwrap().push(format!("list:{}", result.unwrap().len()));
            })
            .unwrap();
        let log = events.clone();
        queue
            .delete(&main.handle(), "missing-id", move |result| {
                log.lock().unwrap().push(format!("delete:{}", result.is_ok()));
            })
            .unwrap();

        for _ in 0..3 {
            assert!(main.run_next(Duration::from_secs(5)));
        }
        assert_eq!(
            *events.lock().unwrap(),
            vec!["create:first", "list:1", "delete:true"]
        );
    }

    #[test]
    fn submit_returns_store_result() {
        let clock = Arc::new(ManualClock::at("2024-06-01 12:00:00").unwrap());
        let queue = NoteQueue::in_memory(clock).unwrap();
        let created = queue
            .submit(|store| store.create("t", "d"))
            .unwrap()
            .blocking_recv()
            .unwrap()
            .unwrap();
        let count = queue
            .submit(|store| store.count())
            .unwrap()
            .blocking_recv()
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(created.created_at, "2024-06-01 12:00:00");
        queue.shutdown();
    }
}
