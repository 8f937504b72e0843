//! Async driver wiring a `QuotePaginator` to a `PagedSource`.
//!
//! # Responsibility
//! - Spawn dispatched fetches on the tokio runtime.
//! - Route completions back over a channel so only the owner mutates the
//!   paginator.
//!
//! # Invariants
//! - Paginator state changes only inside `&mut self` methods of the owner.
//! - Completions from a paginator replaced by `reload` are dropped.

use crate::feed::paginator::{
    FeedError, PageOutcome, PageTicket, PaginatorConfig, QuotePaginator,
};
use crate::feed::probe::ConnectivityProbe;
use crate::feed::source::{FetchFailure, PagedSource};
use crate::model::quote::QuotePage;
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Completion {
    ticket: PageTicket,
    result: Result<QuotePage, FetchFailure>,
}

/// Owner of one live paginator plus its collaborators.
pub struct QuoteFeed {
    paginator: QuotePaginator,
    config: PaginatorConfig,
    source: Arc<dyn PagedSource>,
    probe: Arc<dyn ConnectivityProbe>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl QuoteFeed {
    pub fn new(
        source: Arc<dyn PagedSource>,
        probe: Arc<dyn ConnectivityProbe>,
        config: PaginatorConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            paginator: QuotePaginator::with_config(config),
            config,
            source,
            probe,
            tx,
            rx,
        }
    }

    pub fn paginator(&self) -> &QuotePaginator {
        &self.paginator
    }

    /// Dispatches the first page. Returns whether a fetch was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_first_page(&mut self) -> Result<bool, FeedError> {
        let ticket = self.paginator.request_next_page(self.probe.as_ref())?;
        Ok(self.spawn_fetch(ticket))
    }

    /// Advances and dispatches the next page. Returns whether a fetch was
    /// started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_more(&mut self) -> Result<bool, FeedError> {
        let ticket = self
            .paginator
            .advance_and_request_next_page(self.probe.as_ref())?;
        Ok(self.spawn_fetch(ticket))
    }

    /// Scroll hook: loads more when `last_visible_index` is near the end.
    pub fn on_scrolled(&mut self, last_visible_index: usize) -> Result<bool, FeedError> {
        if self.paginator.is_loading()
            || !self.paginator.has_more()
            || !self.paginator.near_end(last_visible_index)
        {
            return Ok(false);
        }
        self.load_more()
    }

    /// Discards the current paginator and starts over from page 0 state.
    ///
    /// An in-flight fetch of the old paginator still completes, but its
    /// result is ignored.
    pub fn reload(&mut self) {
        debug!(
            "event=feed_reload module=feed status=ok old_paginator={}",
            self.paginator.id()
        );
        self.paginator = QuotePaginator::with_config(self.config);
    }

    /// Waits for the outstanding fetch and applies it.
    ///
    /// Returns `None` when nothing is loading.
    pub async fn next_update(&mut self) -> Option<Result<PageOutcome, FeedError>> {
        while self.paginator.is_loading() {
            let completion = self.rx.recv().await?;
            match self.paginator.complete(completion.ticket, completion.result) {
                Ok(PageOutcome::Stale) => continue,
                applied => return Some(applied),
            }
        }
        None
    }

    fn spawn_fetch(&self, ticket: Option<PageTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let fetch =
                tokio::spawn(async move { source.fetch_page(ticket.limit, ticket.skip).await });
            let result = match fetch.await {
                Ok(result) => result,
                Err(join_error) => Err(FetchFailure::Transport(format!(
                    "fetch task aborted: {join_error}"
                ))),
            };
            let _ = tx.send(Completion { ticket, result });
        });
        true
    }
}
