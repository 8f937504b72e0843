use dailyquotes_core::feed::paginator::{FeedError, PageOutcome, PageTicket, QuotePaginator};
use dailyquotes_core::feed::probe::StaticProbe;
use dailyquotes_core::model::quote::{Quote, QuotePage};

/// In-memory stand-in for the remote feed: `total` quotes numbered from 0.
struct Feed {
    total: u32,
    served: usize,
}

impl Feed {
    fn new(total: u32) -> Self {
        Self { total, served: 0 }
    }

    fn serve(&mut self, ticket: PageTicket) -> QuotePage {
        self.served += 1;
        let end = (ticket.skip + ticket.limit).min(self.total);
        let quotes = (ticket.skip..end)
            .map(|i| Quote::new(i.to_string(), format!("quote {i}"), "author"))
            .collect();
        QuotePage::new(quotes, self.total)
    }
}

fn load_first(paginator: &mut QuotePaginator, feed: &mut Feed, probe: &StaticProbe) -> PageOutcome {
    let ticket = paginator.request_next_page(probe).unwrap().unwrap();
    paginator.complete(ticket, Ok(feed.serve(ticket))).unwrap()
}

fn load_next(paginator: &mut QuotePaginator, feed: &mut Feed, probe: &StaticProbe) -> PageOutcome {
    let ticket = paginator
        .advance_and_request_next_page(probe)
        .unwrap()
        .unwrap();
    paginator.complete(ticket, Ok(feed.serve(ticket))).unwrap()
}

#[test]
fn twenty_five_items_exhaust_after_third_page() {
    let online = StaticProbe::new(true);
    let mut feed = Feed::new(25);
    let mut paginator = QuotePaginator::new(10);

    assert_eq!(
        load_first(&mut paginator, &mut feed, &online),
        PageOutcome::Replaced { count: 10 }
    );
    assert!(paginator.has_more());

    assert_eq!(
        load_next(&mut paginator, &mut feed, &online),
        PageOutcome::Appended { count: 10 }
    );
    assert!(paginator.has_more());

    assert_eq!(
        load_next(&mut paginator, &mut feed, &online),
        PageOutcome::Appended { count: 5 }
    );
    assert!(!paginator.has_more());

    let ids: Vec<String> = paginator
        .accumulated()
        .iter()
        .map(|q| q.id.clone())
        .collect();
    let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
    assert_eq!(feed.served, 3);
}

#[test]
fn single_full_page_with_matching_total_is_terminal() {
    let online = StaticProbe::new(true);
    let mut feed = Feed::new(10);
    let mut paginator = QuotePaginator::new(10);

    load_first(&mut paginator, &mut feed, &online);
    assert!(!paginator.has_more());
    assert_eq!(paginator.accumulated().len(), 10);

    for _ in 0..3 {
        assert_eq!(paginator.advance_and_request_next_page(&online), Ok(None));
    }
    assert_eq!(paginator.current_page(), 0);
    assert_eq!(feed.served, 1);
}

#[test]
fn empty_first_page_exhausts_without_appending() {
    let online = StaticProbe::new(true);
    let mut feed = Feed::new(0);
    let mut paginator = QuotePaginator::new(10);

    assert_eq!(
        load_first(&mut paginator, &mut feed, &online),
        PageOutcome::Exhausted
    );
    assert!(!paginator.has_more());
    assert!(paginator.accumulated().is_empty());
    assert_eq!(paginator.request_next_page(&online), Ok(None));
}

#[test]
fn empty_later_page_keeps_accumulated() {
    let online = StaticProbe::new(true);
    let mut paginator = QuotePaginator::new(2);
    let first = paginator.request_next_page(&online).unwrap().unwrap();
    let quotes = vec![Quote::new("1", "a", "x"), Quote::new("2", "b", "y")];
    paginator
        .complete(first, Ok(QuotePage::new(quotes, 100)))
        .unwrap();

    let second = paginator
        .advance_and_request_next_page(&online)
        .unwrap()
        .unwrap();
    assert_eq!(
        paginator.complete(second, Ok(QuotePage::new(Vec::new(), 100))),
        Ok(PageOutcome::Exhausted)
    );
    assert_eq!(paginator.accumulated().len(), 2);
    assert!(!paginator.has_more());
}

#[test]
fn advance_while_loading_is_a_no_op() {
    let online = StaticProbe::new(true);
    let mut paginator = QuotePaginator::new(10);
    let pending = paginator.request_next_page(&online).unwrap().unwrap();

    assert_eq!(paginator.advance_and_request_next_page(&online), Ok(None));
    assert_eq!(paginator.advance_and_request_next_page(&online), Ok(None));
    assert_eq!(paginator.request_next_page(&online), Ok(None));
    assert_eq!(paginator.current_page(), 0);
    assert!(paginator.is_loading());

    let mut feed = Feed::new(40);
    paginator.complete(pending, Ok(feed.serve(pending))).unwrap();
    assert!(!paginator.is_loading());
}

#[test]
fn offline_advance_rolls_back_and_dispatches_nothing() {
    let probe = StaticProbe::new(true);
    let mut feed = Feed::new(100);
    let mut paginator = QuotePaginator::new(10);
    load_first(&mut paginator, &mut feed, &probe);
    load_next(&mut paginator, &mut feed, &probe);
    assert_eq!(paginator.current_page(), 1);

    probe.set_online(false);
    // Advances to page 2, then the offline gate steps back to 1.
    assert_eq!(
        paginator.advance_and_request_next_page(&probe),
        Err(FeedError::Offline)
    );
    assert_eq!(paginator.current_page(), 1);
    assert!(!paginator.is_loading());
    assert!(paginator.has_more());
    assert_eq!(paginator.accumulated().len(), 20);

    probe.set_online(true);
    let retry = paginator
        .advance_and_request_next_page(&probe)
        .unwrap()
        .unwrap();
    assert_eq!((retry.page, retry.skip), (2, 20));
}

#[test]
fn offline_first_page_stays_at_zero() {
    let offline = StaticProbe::new(false);
    let mut paginator = QuotePaginator::new(10);
    assert_eq!(
        paginator.request_next_page(&offline),
        Err(FeedError::Offline)
    );
    assert_eq!(
        paginator.advance_and_request_next_page(&offline),
        Err(FeedError::Offline)
    );
    assert_eq!(paginator.current_page(), 0);
    assert!(!paginator.is_loading());
}
