//! Test fixture creation for the user and quote databases

use super::constants::*;
use anyhow::Result;
use quotes_server::user::{NewPasswordCredentials, PasswordHasher, UserRole};
use quotes_server::{SqliteQuoteStore, SqliteUserStore, UserStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Creates temporary databases seeded with the standard test users:
/// two regular users and one admin.
pub fn create_test_stores() -> Result<(TempDir, Arc<SqliteUserStore>, Arc<SqliteQuoteStore>)> {
    let dir = TempDir::new()?;

    let user_store = Arc::new(SqliteUserStore::new(dir.path().join("user.db"))?);
    add_user(user_store.as_ref(), TEST_USER, TEST_PASS, UserRole::User)?;
    add_user(user_store.as_ref(), OTHER_USER, OTHER_PASS, UserRole::User)?;
    add_user(user_store.as_ref(), ADMIN_USER, ADMIN_PASS, UserRole::Admin)?;

    let quote_store = Arc::new(SqliteQuoteStore::new(dir.path().join("quotes.db"))?);

    Ok((dir, user_store, quote_store))
}

fn add_user(store: &dyn UserStore, username: &str, password: &str, role: UserRole) -> Result<i64> {
    let hasher = PasswordHasher::Argon2;
    let salt = hasher.generate_b64_salt();
    let hash = hasher.hash(password.as_bytes(), &salt)?;
    store.create_user(username, role, &NewPasswordCredentials { salt, hash, hasher })
}
