//! Periodic daily-quote notifications.
//!
//! # Responsibility
//! - Define the job body (`DailyQuoteJob`) and the notification payload.
//! - Register/cancel the job with the host scheduler according to the
//!   persisted notification toggle.
//!
//! # Invariants
//! - The job is registered under [`DAILY_QUOTE_WORK`] at most once.
//! - The toggle is persisted before the scheduler is touched.

pub mod job;
pub mod scheduler;

pub use job::{
    DailyQuoteJob, LogSink, Notification, NotificationSink, NOTIFICATION_CHANNEL_ID,
    NOTIFICATION_ID, NOTIFICATION_TITLE,
};
pub use scheduler::{BackoffPolicy, JobOutcome, JobScheduler, PeriodicJob};

use crate::settings::{SettingsError, SettingsStore};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Unique work name of the daily quote job.
pub const DAILY_QUOTE_WORK: &str = "daily_quote_work";

/// Default period between notifications.
pub const DEFAULT_NOTIFY_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Persists the toggle, then schedules or cancels the daily quote job.
///
/// Enabling while the job is already scheduled keeps the existing task.
///
/// # Errors
/// - Settings write failures; the scheduler is left untouched then.
pub fn set_notifications_enabled(
    settings: &SettingsStore,
    scheduler: &JobScheduler,
    enabled: bool,
    interval: Duration,
    job: Arc<dyn PeriodicJob>,
) -> Result<(), SettingsError> {
    settings.set_notifications_enabled(enabled)?;
    if enabled {
        scheduler.schedule_unique_periodic(DAILY_QUOTE_WORK, interval, job);
    } else {
        scheduler.cancel(DAILY_QUOTE_WORK);
    }
    info!("event=notify_toggle module=notifier status=ok enabled={enabled}");
    Ok(())
}

/// Re-registers the job at startup when the persisted toggle is on.
///
/// Returns whether the job is scheduled afterwards.
pub fn restore_schedule(
    settings: &SettingsStore,
    scheduler: &JobScheduler,
    interval: Duration,
    job: Arc<dyn PeriodicJob>,
) -> bool {
    if !settings.notifications_enabled() {
        return false;
    }
    scheduler.schedule_unique_periodic(DAILY_QUOTE_WORK, interval, job);
    scheduler.is_scheduled(DAILY_QUOTE_WORK)
}
