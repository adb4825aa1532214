//! Document table schema.
//!
//! A fresh file reports `PRAGMA user_version = 0`; once the schema is in
//! place the pragma holds [`SCHEMA_VERSION`].

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the document table on a fresh database, or checks that an
/// existing one was written with the schema this build understands.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    match stored_schema_version(conn)? {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            Ok(())
        }
        found => Err(DbError::UnknownSchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        }),
    }
}

/// Reads the schema version recorded in the database.
pub fn stored_schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
