//! HTTP client for the public quotes API.
//!
//! Implements [`PagedSource`](crate::feed::source::PagedSource) and
//! [`RandomQuoteSource`](crate::feed::source::RandomQuoteSource) over reqwest.

mod client;

pub use client::{QuotesApiClient, QuotesApiConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
