//! "Fetch one random quote and notify" job.

use crate::clock::Clock;
use crate::feed::source::RandomQuoteSource;
use crate::model::quote::Quote;
use crate::notifier::scheduler::{JobOutcome, PeriodicJob};
use crate::settings::SettingsStore;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

pub const NOTIFICATION_CHANNEL_ID: &str = "daily_quotes_channel";
pub const NOTIFICATION_ID: u32 = 42;
pub const NOTIFICATION_TITLE: &str = "Daily Quote";

/// User-facing notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub channel_id: &'static str,
    pub title: String,
    /// Collapsed text: the quote content.
    pub text: String,
    /// Expanded text: content plus attribution.
    pub big_text: String,
}

impl Notification {
    pub fn daily_quote(quote: &Quote) -> Self {
        Self {
            id: NOTIFICATION_ID,
            channel_id: NOTIFICATION_CHANNEL_ID,
            title: NOTIFICATION_TITLE.to_string(),
            text: quote.content.clone(),
            big_text: quote.attributed_text(),
        }
    }
}

/// Displays notifications. Implemented by the host shell.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Sink that only writes the notification to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: &Notification) {
        info!(
            "event=notify_show module=notifier status=ok notification_id={} channel={}",
            notification.id, notification.channel_id
        );
    }
}

/// Periodic job body: one random quote, one notification.
pub struct DailyQuoteJob {
    source: Arc<dyn RandomQuoteSource>,
    sink: Arc<dyn NotificationSink>,
    settings: Arc<SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl DailyQuoteJob {
    pub fn new(
        source: Arc<dyn RandomQuoteSource>,
        sink: Arc<dyn NotificationSink>,
        settings: Arc<SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            sink,
            settings,
            clock,
        }
    }

    /// Runs once.
    ///
    /// Returns `Retry` when the quote could not be fetched; the host
    /// scheduler owns any backoff.
    pub async fn run_once(&self) -> JobOutcome {
        let quote = match self.source.fetch_random().await {
            Ok(quote) => quote,
            Err(err) => {
                warn!("event=notify_run module=notifier status=retry error={err}");
                return JobOutcome::Retry;
            }
        };

        self.sink.notify(&Notification::daily_quote(&quote));

        let now_ms = self.clock.epoch_millis();
        if let Err(err) = self.settings.set_last_notification_ms(now_ms) {
            warn!("event=notify_record module=notifier status=error error={err}");
        }
        info!(
            "event=notify_run module=notifier status=ok quote_id={} at_ms={}",
            quote.id, now_ms
        );
        JobOutcome::Success
    }
}

#[async_trait]
impl PeriodicJob for DailyQuoteJob {
    async fn run(&self) -> JobOutcome {
        self.run_once().await
    }
}
