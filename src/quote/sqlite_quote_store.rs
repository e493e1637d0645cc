use crate::quote::models::{Comment, NewComment, NewQuote, Quote, QuotePage, VoteKind};
use crate::quote::quote_store::{CommentStore, QuoteListQuery, QuoteStore};
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, OnDelete, SqlType, Table, VersionedSchema, COLUMN,
    DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const QUOTE_TABLE_V_0: Table = Table {
    name: "quote",
    columns: &[
        Column {
            name: "id",
            primary_key: true,
            ..COLUMN
        },
        Column {
            name: "content",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "author",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "owner_id",
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "is_verified",
            non_null: true,
            default: Some("0"),
            ..COLUMN
        },
        Column {
            name: "created_at",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "updated_at",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
    ],
    indices: &[
        ("idx_quote_created_at", "created_at"),
        ("idx_quote_owner_id", "owner_id"),
    ],
    unique_constraints: &[],
};

// One row per (quote, voter); the kind column holds the current vote. The
// unique constraint is what makes a simultaneous like and dislike by the
// same voter unrepresentable.
const VOTE_TABLE_V_0: Table = Table {
    name: "vote",
    columns: &[
        Column {
            name: "id",
            primary_key: true,
            ..COLUMN
        },
        Column {
            name: "quote_id",
            non_null: true,
            references: Some(ForeignKey {
                table: "quote",
                column: "id",
                on_delete: OnDelete::Cascade,
            }),
            ..COLUMN
        },
        Column {
            name: "user_id",
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "kind",
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "created",
            default: Some(DEFAULT_TIMESTAMP),
            ..COLUMN
        },
    ],
    indices: &[("idx_vote_quote_id", "quote_id")],
    unique_constraints: &[&["quote_id", "user_id"]],
};

// No foreign key on quote_id: deleting a quote leaves its comments behind.
const COMMENT_TABLE_V_0: Table = Table {
    name: "comment",
    columns: &[
        Column {
            name: "id",
            primary_key: true,
            ..COLUMN
        },
        Column {
            name: "content",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "user_id",
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "quote_id",
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "created_at",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
    ],
    indices: &[("idx_comment_quote_id", "quote_id")],
    unique_constraints: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[QUOTE_TABLE_V_0, VOTE_TABLE_V_0, COMMENT_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteQuoteStore {
    conn: Arc<Mutex<Connection>>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Escapes LIKE wildcards so a search string only ever matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const QUOTE_COLUMNS: &str = "id, content, author, owner_id, is_verified, created_at, updated_at";

impl SqliteQuoteStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(&db_path, VERSIONED_SCHEMAS)
            .with_context(|| format!("Failed to open quote database {:?}", db_path.as_ref()))?;
        Ok(SqliteQuoteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_quote(row: &rusqlite::Row) -> rusqlite::Result<Quote> {
        Ok(Quote {
            id: row.get("id")?,
            content: row.get("content")?,
            author: row.get("author")?,
            owner_id: row.get("owner_id")?,
            is_verified: row.get::<_, i64>("is_verified")? != 0,
            likes: Vec::new(),
            dislikes: Vec::new(),
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        })
    }

    fn load_votes(conn: &Connection, quote: &mut Quote) -> Result<()> {
        let mut stmt =
            conn.prepare("SELECT user_id, kind FROM vote WHERE quote_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![quote.id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i32>(1)?))
        })?;
        for row in rows {
            let (user_id, kind) = row?;
            match VoteKind::from_int(kind) {
                Some(VoteKind::Like) => quote.likes.push(user_id),
                Some(VoteKind::Dislike) => quote.dislikes.push(user_id),
                None => {}
            }
        }
        Ok(())
    }

    fn read_quote(conn: &Connection, id: i64) -> Result<Option<Quote>> {
        let quote = conn
            .query_row(
                &format!("SELECT {} FROM quote WHERE id = ?1", QUOTE_COLUMNS),
                params![id],
                Self::row_to_quote,
            )
            .optional()?;
        match quote {
            None => Ok(None),
            Some(mut quote) => {
                Self::load_votes(conn, &mut quote)?;
                Ok(Some(quote))
            }
        }
    }

    fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get("id")?,
            content: row.get("content")?,
            author_id: row.get("user_id")?,
            quote_id: row.get("quote_id")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }
}

impl QuoteStore for SqliteQuoteStore {
    fn insert_quote(&self, new: NewQuote) -> Result<Quote> {
        let conn = self.conn.lock().unwrap();
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO quote (content, author, owner_id, is_verified, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![new.content, new.author, new.owner_id, now],
        )?;
        let id = conn.last_insert_rowid();
        Self::read_quote(&conn, id)?.context("Inserted quote disappeared")
    }

    fn get_quote(&self, id: i64) -> Result<Option<Quote>> {
        let conn = self.conn.lock().unwrap();
        Self::read_quote(&conn, id)
    }

    fn list_quotes(&self, query: &QuoteListQuery) -> Result<QuotePage> {
        let conn = self.conn.lock().unwrap();

        let mut conditions: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(search) = query.search.as_deref() {
            let pattern = like_pattern(search);
            conditions.push("(content LIKE ? ESCAPE '\\' OR author LIKE ? ESCAPE '\\')");
            args.push(Value::from(pattern.clone()));
            args.push(Value::from(pattern));
        }
        if query.verified_only {
            conditions.push("is_verified = 1");
        }
        let where_sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let total_quotes: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM quote{}", where_sql),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let offset = (page as i64 - 1) * limit as i64;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM quote{} ORDER BY {} DESC LIMIT ? OFFSET ?",
            QUOTE_COLUMNS,
            where_sql,
            query.sort.column()
        ))?;
        args.push(Value::from(limit as i64));
        args.push(Value::from(offset));
        let mut quotes = stmt
            .query_map(params_from_iter(args.iter()), Self::row_to_quote)?
            .collect::<Result<Vec<Quote>, _>>()?;
        for quote in quotes.iter_mut() {
            Self::load_votes(&conn, quote)?;
        }

        let total_quotes = total_quotes as u64;
        let limit = limit as u64;
        Ok(QuotePage {
            quotes,
            total_pages: total_quotes.div_ceil(limit),
            total_quotes,
            current_page: page,
        })
    }

    fn update_quote(&self, id: i64, content: &str, author: &str) -> Result<Option<Quote>> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE quote SET content = ?2, author = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, content, author, now_rfc3339()],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Self::read_quote(&conn, id)
    }

    fn delete_quote(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM quote WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn toggle_vote(&self, quote_id: i64, user_id: i64, kind: VoteKind) -> Result<Option<Quote>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let quote_exists = tx
            .query_row(
                "SELECT 1 FROM quote WHERE id = ?1",
                params![quote_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !quote_exists {
            return Ok(None);
        }

        let current: Option<i32> = tx
            .query_row(
                "SELECT kind FROM vote WHERE quote_id = ?1 AND user_id = ?2",
                params![quote_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            // Same kind again: un-vote.
            Some(existing) if existing == kind.as_int() => {
                tx.execute(
                    "DELETE FROM vote WHERE quote_id = ?1 AND user_id = ?2",
                    params![quote_id, user_id],
                )?;
            }
            // Opposite kind recorded: flip it, which also clears the old set.
            Some(_) => {
                tx.execute(
                    "UPDATE vote SET kind = ?3 WHERE quote_id = ?1 AND user_id = ?2",
                    params![quote_id, user_id, kind.as_int()],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO vote (quote_id, user_id, kind) VALUES (?1, ?2, ?3)",
                    params![quote_id, user_id, kind.as_int()],
                )?;
            }
        }

        tx.execute(
            "UPDATE quote SET updated_at = ?2 WHERE id = ?1",
            params![quote_id, now_rfc3339()],
        )?;
        tx.commit()?;

        Self::read_quote(&conn, quote_id)
    }

    fn toggle_verified(&self, id: i64) -> Result<Option<Quote>> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE quote SET is_verified = 1 - is_verified, updated_at = ?2 WHERE id = ?1",
            params![id, now_rfc3339()],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Self::read_quote(&conn, id)
    }
}

impl CommentStore for SqliteQuoteStore {
    fn insert_comment(&self, new: NewComment) -> Result<Comment> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO comment (content, user_id, quote_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![new.content, new.author_id, new.quote_id, now_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, content, user_id, quote_id, created_at FROM comment WHERE id = ?1",
            params![id],
            Self::row_to_comment,
        )
        .context("Inserted comment disappeared")
    }

    fn get_quote_comments(&self, quote_id: i64) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, content, user_id, quote_id, created_at FROM comment
             WHERE quote_id = ?1 ORDER BY id",
        )?;
        let comments = stmt
            .query_map(params![quote_id], Self::row_to_comment)?
            .collect::<Result<Vec<Comment>, _>>()?;
        Ok(comments)
    }
}
