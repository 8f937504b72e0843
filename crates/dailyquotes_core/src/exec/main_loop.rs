//! Presentation-side mailbox.

use log::debug;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Callback queued for the presentation thread.
pub type MainTask = Box<dyn FnOnce() + Send + 'static>;

/// Mailbox owned by the presentation thread.
///
/// Callbacks posted through any [`MainHandle`] run only inside
/// [`MainLoop::run_pending`] or [`MainLoop::run_next`], on the caller's thread.
pub struct MainLoop {
    tx: Sender<MainTask>,
    rx: Receiver<MainTask>,
}

impl MainLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Returns a cloneable posting handle for background code.
    pub fn handle(&self) -> MainHandle {
        MainHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs every callback already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one callback and runs it.
    ///
    /// Returns `false` when nothing arrived in time.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            // Unreachable while `self.tx` is alive.
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting side of a [`MainLoop`].
#[derive(Clone)]
pub struct MainHandle {
    tx: Sender<MainTask>,
}

impl MainHandle {
    /// Queues `task` for the presentation thread.
    ///
    /// Returns `false` when the main loop is gone; the task is dropped.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        let delivered = self.tx.send(Box::new(task)).is_ok();
        if !delivered {
            debug!("event=main_post module=exec status=dropped");
        }
        delivered
    }
}
