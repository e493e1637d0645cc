//! Quote and comment data models
//!
//! Wire field names are camelCase with the owner serialized as "user",
//! matching the JSON contract of the public API.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    pub content: String,
    pub author: String,
    #[serde(rename = "user")]
    pub owner_id: i64,
    pub is_verified: bool,
    /// Ids of the identities currently liking this quote. Disjoint from
    /// `dislikes` at all times.
    pub likes: Vec<i64>,
    pub dislikes: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuote {
    pub content: String,
    pub author: String,
    pub owner_id: i64,
}

/// One page of the quote listing, with totals computed over the filtered set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePage {
    pub quotes: Vec<Quote>,
    pub total_pages: u64,
    pub total_quotes: u64,
    pub current_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_int(self) -> i32 {
        match self {
            VoteKind::Like => 1,
            VoteKind::Dislike => 2,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(VoteKind::Like),
            2 => Some(VoteKind::Dislike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(rename = "user")]
    pub author_id: i64,
    #[serde(rename = "quote")]
    pub quote_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub author_id: i64,
    pub quote_id: i64,
}
