use super::models::{Comment, NewComment, NewQuote, Quote, QuotePage, VoteKind};
use anyhow::Result;

pub const DEFAULT_PAGE_SIZE: u32 = 7;

/// The closed set of keys the listing can be sorted by. Sort direction is
/// always descending; there is no ascending option on the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Content,
    Author,
}

impl QuoteSortField {
    /// Parses the wire name used in the `sortBy` query parameter.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(QuoteSortField::CreatedAt),
            "updatedAt" => Some(QuoteSortField::UpdatedAt),
            "content" => Some(QuoteSortField::Content),
            "author" => Some(QuoteSortField::Author),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            QuoteSortField::CreatedAt => "created_at",
            QuoteSortField::UpdatedAt => "updated_at",
            QuoteSortField::Content => "content",
            QuoteSortField::Author => "author",
        }
    }
}

/// Listing parameters. Search and verified-only compose conjunctively;
/// totals always reflect the filtered set.
#[derive(Debug, Clone)]
pub struct QuoteListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort: QuoteSortField,
    pub verified_only: bool,
}

impl Default for QuoteListQuery {
    fn default() -> Self {
        QuoteListQuery {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            sort: QuoteSortField::default(),
            verified_only: false,
        }
    }
}

pub trait QuoteStore: Send + Sync {
    /// Inserts a new quote owned by `new.owner_id` and returns it.
    fn insert_quote(&self, new: NewQuote) -> Result<Quote>;

    /// Returns a quote with its vote sets loaded.
    /// Returns Ok(None) if the quote does not exist.
    fn get_quote(&self, id: i64) -> Result<Option<Quote>>;

    /// Returns one page of quotes matching the query filters, sorted
    /// descending by the query's sort field.
    fn list_quotes(&self, query: &QuoteListQuery) -> Result<QuotePage>;

    /// Replaces content and author, bumping updated_at.
    /// Returns Ok(None) if the quote does not exist.
    fn update_quote(&self, id: i64, content: &str, author: &str) -> Result<Option<Quote>>;

    /// Deletes a quote and its votes. Comments are left in place.
    /// Returns Ok(false) if the quote does not exist.
    fn delete_quote(&self, id: i64) -> Result<bool>;

    /// Toggles a like or dislike by `user_id` on a quote, atomically.
    ///
    /// Casting a vote of one kind always clears any vote of the other kind
    /// by the same user; casting the same kind twice removes the vote. There
    /// is no "already voted" error.
    /// Returns Ok(None) if the quote does not exist.
    fn toggle_vote(&self, quote_id: i64, user_id: i64, kind: VoteKind) -> Result<Option<Quote>>;

    /// Flips the verification flag, whatever its current state.
    /// Returns Ok(None) if the quote does not exist.
    fn toggle_verified(&self, id: i64) -> Result<Option<Quote>>;
}

pub trait CommentStore: Send + Sync {
    /// Inserts a comment and returns it. The referenced quote is not
    /// required to exist.
    fn insert_comment(&self, new: NewComment) -> Result<Comment>;

    /// Returns all comments on a quote, oldest first. An unknown quote id
    /// yields an empty list.
    fn get_quote_comments(&self, quote_id: i64) -> Result<Vec<Comment>>;
}

/// Combined trait for the single store backing both quotes and comments.
pub trait FullQuoteStore: QuoteStore + CommentStore {}

impl<T: QuoteStore + CommentStore> FullQuoteStore for T {}
