//! Single-thread FIFO worker owning non-shareable state.

use super::MainHandle;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Worker lifecycle failure.
#[derive(Debug)]
pub enum WorkerError {
    /// The OS refused to start the worker thread.
    Spawn(std::io::Error),
    /// State initialization failed on the worker thread.
    Init(String),
    /// The worker has shut down; the job was not queued.
    Closed,
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start worker thread: {err}"),
            Self::Init(message) => write!(f, "worker initialization failed: {message}"),
            Self::Closed => write!(f, "worker is shut down"),
        }
    }
}

impl Error for WorkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Dedicated thread that owns `S` and runs queued jobs one at a time.
///
/// `S` is built on the worker thread, so it does not need to be `Send`
/// (a `rusqlite::Connection` is the intended occupant).
pub struct SerialWorker<S> {
    name: String,
    tx: Option<Sender<Job<S>>>,
    thread: Option<JoinHandle<()>>,
}

impl<S: 'static> SerialWorker<S> {
    /// Starts the worker and waits for `init` to finish on it.
    ///
    /// # Errors
    /// - `Spawn` when the thread cannot be created.
    /// - `Init` when `init` fails; the thread has exited by then.
    pub fn spawn<F, E>(name: &str, init: F) -> Result<Self, WorkerError>
    where
        F: FnOnce() -> Result<S, E> + Send + 'static,
        E: Display,
    {
        let (job_tx, job_rx) = mpsc::channel::<Job<S>>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);
        let worker_name = name.to_string();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = match init() {
                    Ok(state) => {
                        let _ = ready_tx.send(Ok(()));
                        state
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };

                while let Ok(job) = job_rx.recv() {
                    if catch_unwind(AssertUnwindSafe(|| job(&mut state))).is_err() {
                        error!(
                            "event=worker_job module=exec status=panic worker={}",
                            worker_name
                        );
                    }
                }
                debug!("event=worker_stop module=exec status=ok worker={worker_name}");
            })
            .map_err(WorkerError::Spawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("event=worker_start module=exec status=ok worker={name}");
                Ok(Self {
                    name: name.to_string(),
                    tx: Some(job_tx),
                    thread: Some(thread),
                })
            }
            Ok(Err(message)) => {
                let _ = thread.join();
                error!("event=worker_start module=exec status=error worker={name} error={message}");
                Err(WorkerError::Init(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(WorkerError::Init(format!(
                    "worker `{name}` exited during initialization"
                )))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `job`; its output is handed to `on_main` through `main`.
    pub fn execute<T, J, C>(&self, main: &MainHandle, job: J, on_main: C) -> Result<(), WorkerError>
    where
        T: Send + 'static,
        J: FnOnce(&mut S) -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let main = main.clone();
        self.push(Box::new(move |state| {
            let output = job(state);
            main.post(move || on_main(output));
        }))
    }

    /// Queues `job` and returns a receiver for its output.
    ///
    /// The receiver can be awaited, or read with `blocking_recv` outside a
    /// runtime. It errors if the job panicked.
    pub fn submit<T, J>(&self, job: J) -> Result<oneshot::Receiver<T>, WorkerError>
    where
        T: Send + 'static,
        J: FnOnce(&mut S) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.push(Box::new(move |state| {
            let _ = tx.send(job(state));
        }))?;
        Ok(rx)
    }

    /// Stops accepting jobs, drains the queue and joins the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn push(&self, job: Job<S>) -> Result<(), WorkerError> {
        let tx = self.tx.as_ref().ok_or(WorkerError::Closed)?;
        tx.send(job).map_err(|_| WorkerError::Closed)
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(
                    "event=worker_join module=exec status=error worker={}",
                    self.name
                );
            }
        }
    }
}

impl<S> Drop for SerialWorker<S> {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SerialWorker, WorkerError};
    use crate::exec::MainLoop;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn jobs_run_in_fifo_order_and_report_on_main() {
        let worker =
            SerialWorker::spawn("fifo-test", || Ok::<_, String>(Vec::<u32>::new())).unwrap();
        let main = MainLoop::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for value in 0..5u32 {
            let seen = seen.clone();
            worker
                .execute(
                    &main.handle(),
                    move |log: &mut Vec<u32>| {
                        log.push(value);
                        log.len()
                    },
                    move |len| seen.lock().unwrap().push((value, len)),
                )
                .unwrap();
        }

        let mut delivered = 0;
        while delivered < 5 {
            assert!(main.run_next(Duration::from_secs(5)), "worker stalled");
            delivered += 1;
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]
        );
    }

    #[test]
    fn state_does_not_need_to_be_send() {
        let worker =
            SerialWorker::spawn("rc-test", || Ok::<_, String>(Rc::new(RefCell::new(0)))).unwrap();
        let rx = worker
            .submit(|counter: &mut Rc<RefCell<i32>>| {
                *counter.borrow_mut() += 41;
                *counter.borrow() + 1
            })
            .unwrap();
        assert_eq!(rx.blocking_recv().unwrap(), 42);
    }

    #[test]
    fn init_failure_is_reported() {
        let result = SerialWorker::<()>::spawn("init-fail", || Err("boom"));
        assert!(matches!(result, Err(WorkerError::Init(ref msg)) if msg == "boom"));
    }

    #[test]
    fn panicking_job_does_not_stop_worker() {
        let worker = SerialWorker::spawn("panic-test", || Ok::<_, String>(0u8)).unwrap();
        let failed = worker.submit(|_: &mut u8| -> u8 { panic!("job failure") }).unwrap();
        assert!(failed.blocking_recv().is_err());

        let ok = worker.submit(|state: &mut u8| *state + 7).unwrap();
        assert_eq!(ok.blocking_recv().unwrap(), 7);
        worker.shutdown();
    }
}
