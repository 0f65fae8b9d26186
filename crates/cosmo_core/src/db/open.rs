//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections from a path or from
//!   `ConnectionSettings`.
//! - Configure connection pragmas and the busy timeout.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::{ConnectionSettings, DEFAULT_BUSY_TIMEOUT_MS};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with_mode("file", Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS), || {
        Connection::open(path)
    })
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with_mode("memory", Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS), || {
        Connection::open_in_memory()
    })
}

/// Opens the database described by `settings`.
///
/// `Database=:memory:` selects an in-memory store; any other value is used
/// as a file path. The busy timeout comes from `settings.busy_timeout_ms`.
pub fn open_db_with(settings: &ConnectionSettings) -> DbResult<Connection> {
    info!(
        "event=db_target module=db server={} port={} database={}",
        settings.server, settings.port, settings.database
    );
    if settings.is_in_memory() {
        open_with_mode("memory", settings.busy_timeout(), Connection::open_in_memory)
    } else {
        open_with_mode("file", settings.busy_timeout(), || {
            Connection::open(settings.database.as_str())
        })
    }
}

fn open_with_mode<F>(mode: &'static str, busy_timeout: Duration, connect: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}
