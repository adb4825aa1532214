//! Connection bootstrap.
//!
//! # Invariants
//! - Each open attempt emits exactly one terminal `db_open` event.

use super::schema::ensure_schema;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a database file and ensures the document schema.
///
/// Missing parent directories are not created; callers choose the location.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    bootstrap("file", Instant::now(), Connection::open(path))
}

/// Opens a private in-memory database with the document schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", Instant::now(), Connection::open_in_memory())
}

fn bootstrap(
    mode: &'static str,
    started_at: Instant,
    opened: rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let result: DbResult<Connection> = opened.map_err(DbError::from).and_then(|mut conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        ensure_schema(&mut conn)?;
        Ok(conn)
    });

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
    result
}
