//! Database connection management.
//!
//! Repositories share one connection per database file behind an
//! `Arc<Mutex<..>>`; connection pooling, migrations, and transaction
//! orchestration stay with the application.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::error::{DbError, Result};

/// Shared handle to a single SQLite connection.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Opens a database file and prepares it for repository use.
///
/// Enables WAL journaling for better concurrent access and enforces foreign
/// keys.
pub fn open<P: AsRef<Path>>(path: P) -> Result<SharedConnection> {
    let conn = Connection::open(path.as_ref())
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    Ok(Arc::new(Mutex::new(conn)))
}

/// Opens an in-memory database, mainly for tests and scratch work.
pub fn open_in_memory() -> Result<SharedConnection> {
    let conn =
        Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
    Ok(Arc::new(Mutex::new(conn)))
}
