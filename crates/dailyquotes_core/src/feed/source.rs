//! Remote quote source contracts.

use crate::model::quote::{Quote, QuotePage};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a remote call produced no usable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-success status.
    Status { status: u16, url: String },
    /// Connection, TLS, timeout or body read failure.
    Transport(String),
    /// The body was not the expected JSON shape.
    Decode(String),
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, url } => {
                write!(f, "quotes request failed with status {status}: {url}")
            }
            Self::Transport(message) => write!(f, "quotes request failed: {message}"),
            Self::Decode(message) => write!(f, "invalid quotes payload: {message}"),
        }
    }
}

impl Error for FetchFailure {}

/// Paged access to the quote feed.
#[async_trait]
pub trait PagedSource: Send + Sync {
    /// Fetches up to `limit` quotes after skipping `skip`, in source order.
    async fn fetch_page(&self, limit: u32, skip: u32) -> Result<QuotePage, FetchFailure>;
}

/// Single random quote, used by the periodic notifier.
#[async_trait]
pub trait RandomQuoteSource: Send + Sync {
    async fn fetch_random(&self) -> Result<Quote, FetchFailure>;
}
