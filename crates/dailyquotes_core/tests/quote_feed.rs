use async_trait::async_trait;
use dailyquotes_core::feed::driver::QuoteFeed;
use dailyquotes_core::feed::paginator::{FeedError, PageOutcome, PaginatorConfig};
use dailyquotes_core::feed::probe::StaticProbe;
use dailyquotes_core::feed::source::{FetchFailure, PagedSource};
use dailyquotes_core::model::quote::{Quote, QuotePage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serves `total` quotes; the id carries the call number so tests can tell
/// which fetch produced a page. Scripted failures are consumed first.
struct ScriptedSource {
    total: u32,
    calls: AtomicUsize,
    failures: Mutex<VecDeque<FetchFailure>>,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedSource {
    fn new(total: u32) -> Arc<Self> {
        Arc::new(Self {
            total,
            calls: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn fail_next(&self, failure: FetchFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PagedSource for ScriptedSource {
    async fn fetch_page(&self, limit: u32, skip: u32) -> Result<QuotePage, FetchFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((limit, skip));
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        let end = (skip + limit).min(self.total);
        let quotes = (skip..end)
            .map(|i| Quote::new(format!("c{call}-{i}"), format!("quote {i}"), "author"))
            .collect();
        Ok(QuotePage::new(quotes, self.total))
    }
}

fn feed_with(source: Arc<ScriptedSource>, probe: Arc<StaticProbe>) -> QuoteFeed {
    QuoteFeed::new(source, probe, PaginatorConfig::default())
}

#[tokio::test]
async fn pages_load_in_order_until_exhausted() {
    let source = ScriptedSource::new(25);
    let mut feed = feed_with(source.clone(), Arc::new(StaticProbe::new(true)));

    assert_eq!(feed.load_first_page(), Ok(true));
    assert_eq!(
        feed.next_update().await,
        Some(Ok(PageOutcome::Replaced { count: 10 }))
    );
    assert_eq!(feed.load_more(), Ok(true));
    assert_eq!(
        feed.next_update().await,
        Some(Ok(PageOutcome::Appended { count: 10 }))
    );
    assert_eq!(feed.load_more(), Ok(true));
    assert_eq!(
        feed.next_update().await,
        Some(Ok(PageOutcome::Appended { count: 5 }))
    );

    assert!(!feed.paginator().has_more());
    assert_eq!(feed.load_more(), Ok(false));
    assert_eq!(feed.next_update().await, None);
    assert_eq!(feed.paginator().accumulated().len(), 25);
    assert_eq!(source.requests(), vec![(10, 0), (10, 10), (10, 20)]);
}

#[tokio::test]
async fn scroll_hook_only_loads_near_the_end() {
    let source = ScriptedSource::new(100);
    let mut feed = feed_with(source.clone(), Arc::new(StaticProbe::new(true)));
    feed.load_first_page().unwrap();
    feed.next_update().await.unwrap().unwrap();

    assert_eq!(feed.on_scrolled(3), Ok(false));
    assert_eq!(feed.on_scrolled(7), Ok(true));
    // Second trigger while the first is in flight.
    assert_eq!(feed.on_scrolled(9), Ok(false));
    feed.next_update().await.unwrap().unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(feed.paginator().current_page(), 1);
}

#[tokio::test]
async fn offline_load_more_never_calls_source() {
    let source = ScriptedSource::new(100);
    let probe = Arc::new(StaticProbe::new(true));
    let mut feed = feed_with(source.clone(), probe.clone());
    feed.load_first_page().unwrap();
    feed.next_update().await.unwrap().unwrap();
    feed.load_more().unwrap();
    feed.next_update().await.unwrap().unwrap();

    probe.set_online(false);
    assert_eq!(feed.load_more(), Err(FeedError::Offline));
    assert_eq!(feed.paginator().current_page(), 1);
    assert_eq!(feed.next_update().await, None);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn fetch_failure_surfaces_and_keeps_has_more() {
    let source = ScriptedSource::new(100);
    source.fail_next(FetchFailure::Status {
        status: 500,
        url: "http://test/quotes".into(),
    });
    let mut feed = feed_with(source.clone(), Arc::new(StaticProbe::new(true)));

    feed.load_first_page().unwrap();
    let err = feed.next_update().await.unwrap().unwrap_err();
    assert_eq!(err.user_message(), "Failed to load quotes: 500");
    assert!(feed.paginator().has_more());
    assert!(!feed.paginator().is_loading());

    assert_eq!(feed.load_first_page(), Ok(true));
    assert_eq!(
        feed.next_update().await,
        Some(Ok(PageOutcome::Replaced { count: 10 }))
    );
}

#[tokio::test]
async fn reload_drops_completion_of_replaced_paginator() {
    let source = ScriptedSource::new(30);
    let mut feed = feed_with(source.clone(), Arc::new(StaticProbe::new(true)));

    assert_eq!(feed.load_first_page(), Ok(true));
    feed.reload();
    assert!(!feed.paginator().is_loading());

    // Let the old fetch finish before the new one starts.
    for _ in 0..100 {
        if source.calls() == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(source.calls(), 1);

    assert_eq!(feed.load_first_page(), Ok(true));
    assert_eq!(
        feed.next_update().await,
        Some(Ok(PageOutcome::Replaced { count: 10 }))
    );
    assert!(feed
        .paginator()
        .accumulated()
        .iter()
        .all(|quote| quote.id.starts_with("c1-")));
}
