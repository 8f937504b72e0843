//! Remote quote value objects.
//!
//! # Responsibility
//! - Decode the quotes API payloads (`{id, quote, author}` and the paged
//!   `{quotes, total, skip, limit}` envelope).
//!
//! # Invariants
//! - `Quote::id` is always text, even though the API sends numbers.
//! - A `null` or missing `quotes` array decodes as an empty page.

use serde::{Deserialize, Deserializer, Serialize};

/// One quote as served by the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display text. Sent by the API under the `quote` key.
    #[serde(rename = "quote")]
    pub content: String,
    pub author: String,
}

impl Quote {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author: author.into(),
        }
    }

    /// Long-form text used for notifications: content, blank line, attribution.
    pub fn attributed_text(&self) -> String {
        format!("{}\n\n\u{2014} {}", self.content, self.author)
    }
}

/// One page of the remote feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub quotes: Vec<Quote>,
    /// Total number of quotes the source reports.
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
}

impl QuotePage {
    pub fn new(quotes: Vec<Quote>, total: u32) -> Self {
        let limit = u32::try_from(quotes.len()).unwrap_or(u32::MAX);
        Self {
            quotes,
            total,
            skip: 0,
            limit,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Int(value) => value.to_string(),
        RawId::Float(value) => value.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Quote>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Quote>>::deserialize(deserializer)?.unwrap_or_default())
}
