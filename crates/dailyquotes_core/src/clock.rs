//! Caller-supplied time sources.
//!
//! Note timestamps and notifier bookkeeping never read the wall clock
//! directly; they go through [`Clock`] so tests can pin time.

use crate::model::note::TIMESTAMP_FORMAT;
use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::Mutex;

/// Time source used by stores and jobs.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;

    /// Current time in note timestamp format.
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Current time as Unix epoch milliseconds.
    fn epoch_millis(&self) -> i64 {
        self.now().and_utc().timestamp_millis()
    }
}

/// Wall-clock local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn epoch_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Parses `start` with the note timestamp format.
    ///
    /// Returns `None` for malformed input.
    pub fn at(start: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(start, TIMESTAMP_FORMAT)
            .ok()
            .map(Self::new)
    }

    pub fn set(&self, value: NaiveDateTime) {
        *self.lock() = value;
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut guard = self.lock();
        *guard += TimeDelta::seconds(secs);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned clock still holds a valid instant.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
