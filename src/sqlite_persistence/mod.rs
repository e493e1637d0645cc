mod versioned_schema;

pub use versioned_schema::{
    open_versioned, Column, ForeignKey, OnDelete, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION, COLUMN, DEFAULT_TIMESTAMP,
};
