//! Paged quote feed state machine.
//!
//! # Responsibility
//! - Track page offset, in-flight fetch, exhaustion and loaded quotes.
//! - Decide whether a fetch may be dispatched and apply its result.
//!
//! # Invariants
//! - At most one fetch is outstanding; `is_loading()` is true exactly then.
//! - Once `has_more()` is false, no further fetch is ever dispatched.
//! - Page 0 replaces `accumulated`; later pages append in source order.
//! - Completions carrying another paginator's ticket, or arriving when no
//!   fetch is outstanding for that page, are ignored.
//!
//! The paginator performs no I/O. Dispatch returns a [`PageTicket`]; the
//! driver runs the fetch and hands the result back to [`QuotePaginator::complete`].

use crate::feed::probe::ConnectivityProbe;
use crate::feed::source::FetchFailure;
use crate::model::quote::{Quote, QuotePage};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Items from the end at which a scroll position triggers the next page.
pub const PREFETCH_THRESHOLD: usize = 3;

static NEXT_PAGINATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Why a page request produced no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Connectivity gate tripped; the source was not contacted.
    Offline,
    /// The source call failed.
    Fetch(FetchFailure),
}

impl FeedError {
    /// Short message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Offline => "No internet connection. Check your network.".to_string(),
            Self::Fetch(FetchFailure::Status { status, .. }) => {
                format!("Failed to load quotes: {status}")
            }
            Self::Fetch(cause) => format!("Error loading quotes: {cause}"),
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "network is offline"),
            Self::Fetch(cause) => write!(f, "{cause}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Offline => None,
            Self::Fetch(cause) => Some(cause),
        }
    }
}

/// Construction-time paginator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Quotes per page; zero is raised to one.
    pub page_size: u32,
    /// Step `current_page` back after a failed scroll-triggered fetch, the
    /// same way the offline gate does. Off by default.
    pub rollback_on_fetch_error: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            rollback_on_fetch_error: false,
        }
    }
}

/// One dispatched fetch. Must be passed back to `complete` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    paginator_id: u64,
    /// Issued by `advance_and_request_next_page`.
    advanced: bool,
    pub page: u32,
    pub limit: u32,
    pub skip: u32,
}

impl PageTicket {
    pub fn paginator_id(&self) -> u64 {
        self.paginator_id
    }

    pub fn advanced(&self) -> bool {
        self.advanced
    }
}

/// Effect of a completed fetch on the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page 0 loaded and replaced the list.
    Replaced { count: usize },
    /// A later page was appended.
    Appended { count: usize },
    /// The source returned an empty batch; the feed is finished.
    Exhausted,
    /// The ticket did not match the outstanding fetch; nothing changed.
    Stale,
}

/// Feed state machine over `{current_page, is_loading, has_more, accumulated}`.
#[derive(Debug)]
pub struct QuotePaginator {
    id: u64,
    config: PaginatorConfig,
    current_page: u32,
    has_more: bool,
    accumulated: Vec<Quote>,
    in_flight: Option<PageTicket>,
}

impl QuotePaginator {
    pub fn new(page_size: u32) -> Self {
        Self::with_config(PaginatorConfig {
            page_size,
            ..PaginatorConfig::default()
        })
    }

    pub fn with_config(mut config: PaginatorConfig) -> Self {
        if config.page_size == 0 {
            warn!("event=feed_init module=feed status=adjusted page_size=0 applied=1");
            config.page_size = 1;
        }
        Self {
            id: NEXT_PAGINATOR_ID.fetch_add(1, Ordering::Relaxed),
            config,
            current_page: 0,
            has_more: true,
            accumulated: Vec::new(),
            in_flight: None,
        }
    }

    /// Unique per instance; stamped into every ticket.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> PaginatorConfig {
        self.config
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn accumulated(&self) -> &[Quote] {
        &self.accumulated
    }

    /// Whether a scroll position is close enough to the end to load more.
    pub fn near_end(&self, last_visible_index: usize) -> bool {
        last_visible_index.saturating_add(PREFETCH_THRESHOLD) >= self.accumulated.len()
    }

    /// Requests the current page without advancing. Used for the first page.
    ///
    /// Returns `Ok(None)` while loading or after exhaustion.
    ///
    /// # Errors
    /// - `Offline` when the probe reports no network; no state changes.
    pub fn request_next_page(
        &mut self,
        probe: &dyn ConnectivityProbe,
    ) -> Result<Option<PageTicket>, FeedError> {
        if self.suppressed() {
            return Ok(None);
        }
        self.dispatch(probe, false).map(Some)
    }

    /// Scroll-triggered entry point: advances one page, then requests it.
    ///
    /// The busy/exhausted check runs before the advance, so a suppressed
    /// call leaves `current_page` untouched.
    ///
    /// # Errors
    /// - `Offline` when the probe reports no network; the advance is undone.
    pub fn advance_and_request_next_page(
        &mut self,
        probe: &dyn ConnectivityProbe,
    ) -> Result<Option<PageTicket>, FeedError> {
        if self.suppressed() {
            return Ok(None);
        }
        self.current_page = self.current_page.saturating_add(1);
        self.dispatch(probe, true).map(Some)
    }

    /// Applies the result of the fetch described by `ticket`.
    ///
    /// # Errors
    /// - `Fetch` carrying the source failure. `has_more` is untouched and
    ///   `current_page` stays advanced unless `rollback_on_fetch_error` is set
    ///   and the ticket came from an advance.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: Result<QuotePage, FetchFailure>,
    ) -> Result<PageOutcome, FeedError> {
        if self.in_flight != Some(ticket) {
            debug!(
                "event=feed_page module=feed status=stale paginator={} ticket_paginator={} page={}",
                self.id, ticket.paginator_id, ticket.page
            );
            return Ok(PageOutcome::Stale);
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(cause) => {
                if self.config.rollback_on_fetch_error && ticket.advanced && self.current_page > 0
                {
                    self.current_page -= 1;
                }
                warn!(
                    "event=feed_page module=feed status=error page={} current_page={} error={}",
                    ticket.page, self.current_page, cause
                );
                return Err(FeedError::Fetch(cause));
            }
        };

        if page.quotes.is_empty() {
            self.has_more = false;
            info!(
                "event=feed_page module=feed status=empty page={} total={}",
                ticket.page, page.total
            );
            return Ok(PageOutcome::Exhausted);
        }

        let count = page.quotes.len();
        let outcome = if self.current_page == 0 {
            self.accumulated = page.quotes;
            PageOutcome::Replaced { count }
        } else {
            self.accumulated.extend(page.quotes);
            PageOutcome::Appended { count }
        };

        let total_loaded = (u64::from(self.current_page) + 1) * u64::from(self.config.page_size);
        self.has_more = total_loaded < u64::from(page.total);

        info!(
            "event=feed_page module=feed status=ok page={} count={} accumulated={} total={} has_more={}",
            ticket.page,
            count,
            self.accumulated.len(),
            page.total,
            self.has_more
        );
        Ok(outcome)
    }

    fn suppressed(&self) -> bool {
        if self.is_loading() || !self.has_more {
            debug!(
                "event=feed_request module=feed status=skipped loading={} has_more={}",
                self.is_loading(),
                self.has_more
            );
            return true;
        }
        false
    }

    fn dispatch(
        &mut self,
        probe: &dyn ConnectivityProbe,
        advanced: bool,
    ) -> Result<PageTicket, FeedError> {
        if !probe.is_online() {
            if advanced && self.current_page > 0 {
                self.current_page -= 1;
            }
            warn!(
                "event=feed_request module=feed status=offline current_page={}",
                self.current_page
            );
            return Err(FeedError::Offline);
        }

        let ticket = PageTicket {
            paginator_id: self.id,
            advanced,
            page: self.current_page,
            limit: self.config.page_size,
            skip: self.current_page.saturating_mul(self.config.page_size),
        };
        self.in_flight = Some(ticket);
        debug!(
            "event=feed_request module=feed status=dispatched page={} limit={} skip={}",
            ticket.page, ticket.limit, ticket.skip
        );
        Ok(ticket)
    }
}
