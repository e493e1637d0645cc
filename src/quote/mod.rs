mod models;
pub mod policy;
mod quote_store;
mod sqlite_quote_store;

pub use models::{Comment, NewComment, NewQuote, Quote, QuotePage, VoteKind};
pub use quote_store::{
    CommentStore, FullQuoteStore, QuoteListQuery, QuoteSortField, QuoteStore, DEFAULT_PAGE_SIZE,
};
pub use sqlite_quote_store::SqliteQuoteStore;
