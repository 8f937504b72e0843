//! Paginated remote quote feed.
//!
//! # Responsibility
//! - Model the feed as a UI-independent state machine (`QuotePaginator`).
//! - Define the source and connectivity contracts it depends on.
//! - Drive fetches asynchronously through `QuoteFeed`.

pub mod driver;
pub mod paginator;
pub mod probe;
pub mod source;
