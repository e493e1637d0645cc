use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, OnDelete, SqlType, Table, VersionedSchema, COLUMN,
    DEFAULT_TIMESTAMP,
};
use crate::user::user_models::{NewPasswordCredentials, PublicUser, UserCredentials, UserRole};
use crate::user::UserStore;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        Column {
            name: "id",
            primary_key: true,
            ..COLUMN
        },
        Column {
            name: "username",
            sql_type: SqlType::Text,
            non_null: true,
            unique: true,
            ..COLUMN
        },
        Column {
            name: "role",
            sql_type: SqlType::Text,
            non_null: true,
            default: Some("'user'"),
            ..COLUMN
        },
        Column {
            name: "created",
            default: Some(DEFAULT_TIMESTAMP),
            ..COLUMN
        },
    ],
    indices: &[("idx_user_username", "username")],
    unique_constraints: &[],
};

const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        Column {
            name: "user_id",
            non_null: true,
            references: Some(ForeignKey {
                table: "user",
                column: "id",
                on_delete: OnDelete::Cascade,
            }),
            ..COLUMN
        },
        Column {
            name: "salt",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "hash",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "hasher",
            sql_type: SqlType::Text,
            non_null: true,
            ..COLUMN
        },
        Column {
            name: "created",
            default: Some(DEFAULT_TIMESTAMP),
            ..COLUMN
        },
    ],
    indices: &[("idx_user_password_credentials_user_id", "user_id")],
    unique_constraints: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USER_TABLE_V_0, USER_PASSWORD_CREDENTIALS_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(&db_path, VERSIONED_SCHEMAS)
            .with_context(|| format!("Failed to open user database {:?}", db_path.as_ref()))?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(
        &self,
        username: &str,
        role: UserRole,
        credentials: &NewPasswordCredentials,
    ) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO user (username, role) VALUES (?1, ?2)",
            params![username, role.as_str()],
        )
        .with_context(|| format!("Failed to create user {}", username))?;
        let user_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.as_str()
            ],
        )?;
        tx.commit()?;
        Ok(user_id)
    }

    fn get_user(&self, user_id: i64) -> Result<Option<PublicUser>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, username, role FROM user WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((id, username, role)) => {
                let role = match UserRole::from_str(&role) {
                    Some(role) => role,
                    None => bail!("User {} has unknown role '{}'", id, role),
                };
                Ok(Some(PublicUser { id, username, role }))
            }
        }
    }

    fn get_user_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT u.id, u.role, c.salt, c.hash, c.hasher
                 FROM user u JOIN user_password_credentials c ON c.user_id = u.id
                 WHERE u.username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((user_id, role, salt, hash, hasher)) => {
                let role = match UserRole::from_str(&role) {
                    Some(role) => role,
                    None => bail!("User {} has unknown role '{}'", user_id, role),
                };
                Ok(Some(UserCredentials {
                    user_id,
                    role,
                    salt,
                    hash,
                    hasher: hasher.parse()?,
                }))
            }
        }
    }

    fn count_users(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
