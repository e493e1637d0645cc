use anyhow::{bail, Result};
use rusqlite::{params, Connection};

/// Epoch-seconds default for INTEGER timestamp columns.
pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to PRAGMA user_version so that a database created by this
/// crate is distinguishable from an unrelated SQLite file (whose version
/// would be 0 or some small number).
pub const BASE_DB_VERSION: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }

    fn parse(s: &str) -> Option<SqlType> {
        match s {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OnDelete {
    NoAction,
    Cascade,
}

impl OnDelete {
    fn as_sql(self) -> &'static str {
        match self {
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub non_null: bool,
    pub unique: bool,
    pub default: Option<&'static str>,
    pub references: Option<ForeignKey>,
}

/// Base for const column definitions, overridden with struct update syntax.
pub const COLUMN: Column = Column {
    name: "",
    sql_type: SqlType::Integer,
    primary_key: false,
    non_null: false,
    unique: false,
    default: None,
    references: None,
};

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut column_defs = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
            if column.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                def.push_str(" NOT NULL");
            }
            if column.unique {
                def.push_str(" UNIQUE");
            }
            if let Some(default) = column.default {
                def.push_str(&format!(" DEFAULT {}", default));
            }
            if let Some(fk) = column.references {
                def.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    fk.table,
                    fk.column,
                    fk.on_delete.as_sql()
                ));
            }
            column_defs.push(def);
        }
        for unique_columns in self.unique_constraints {
            column_defs.push(format!("UNIQUE ({})", unique_columns.join(", ")));
        }

        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs.join(", ")),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        struct ActualColumn {
            name: String,
            sql_type: Option<SqlType>,
            non_null: bool,
            primary_key: bool,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual: Vec<ActualColumn> = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    sql_type: SqlType::parse(&row.get::<_, String>(2)?),
                    non_null: row.get::<_, i32>(3)? == 1,
                    primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<_, _>>()?;

        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {} ({})",
                self.name,
                actual.len(),
                self.columns.len(),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != Some(expected.sql_type) {
                bail!(
                    "Table {} column {} type mismatch, expected {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch, expected {}",
                    self.name,
                    expected.name,
                    expected.non_null
                );
            }
            if actual.primary_key != expected.primary_key {
                bail!(
                    "Table {} column {} primary key mismatch, expected {}",
                    self.name,
                    expected.name,
                    expected.primary_key
                );
            }
        }

        for (index_name, _) in self.indices {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        if !self.unique_constraints.is_empty() {
            // SQLite surfaces table-level UNIQUE constraints as unique indices.
            let mut stmt = conn.prepare(&format!("PRAGMA index_list({});", self.name))?;
            let unique_indices: Vec<String> = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?))
                })?
                .filter_map(|r| r.ok())
                .filter(|(_, is_unique)| *is_unique == 1)
                .map(|(name, _)| name)
                .collect();

            let mut unique_column_sets: Vec<Vec<String>> = Vec::new();
            for index_name in &unique_indices {
                let mut stmt = conn.prepare(&format!("PRAGMA index_info({});", index_name))?;
                let mut columns: Vec<String> = stmt
                    .query_map([], |row| row.get::<_, String>(2))?
                    .filter_map(|r| r.ok())
                    .collect();
                columns.sort();
                unique_column_sets.push(columns);
            }

            for expected_columns in self.unique_constraints {
                let mut expected: Vec<&str> = expected_columns.to_vec();
                expected.sort_unstable();
                let found = unique_column_sets
                    .iter()
                    .any(|actual| actual.iter().map(String::as_str).eq(expected.iter().copied()));
                if !found {
                    bail!(
                        "Table {} is missing unique constraint on ({})",
                        self.name,
                        expected_columns.join(", ")
                    );
                }
            }
        }

        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

/// Opens a database file, creating the latest schema on a fresh file and
/// validating + migrating an existing one.
pub fn open_versioned<P: AsRef<std::path::Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let path = db_path.as_ref();
    let is_new_db = !path.exists();

    let conn = Connection::open(path)?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    if is_new_db {
        schemas.last().unwrap().create(&conn)?;
        return Ok(conn);
    }

    let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 0 {
        bail!(
            "Database {:?} has version {}, not created by this server",
            path,
            raw_version
        );
    }
    let db_version = db_version as usize;
    if db_version >= schemas.len() {
        bail!("Database {:?} version {} is too new", path, db_version);
    }

    schemas[db_version].validate(&conn)?;

    let mut latest = db_version;
    for schema in schemas.iter().skip(db_version + 1) {
        if let Some(migration_fn) = schema.migration {
            tracing::info!("Migrating {:?} from version {} to {}", path, latest, schema.version);
            migration_fn(&conn)?;
        }
        latest = schema.version;
    }
    if latest != db_version {
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
            [],
        )?;
    }

    Ok(conn)
}
