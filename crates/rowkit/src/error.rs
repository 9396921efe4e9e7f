//! Error types for rowkit.

use miette::Diagnostic;
use thiserror::Error;

/// Database error type for rowkit operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    #[diagnostic(
        code(rowkit::connection),
        help("Check if the database file exists and is accessible")
    )]
    ConnectionError(String),

    #[error("Database query failed: {0}")]
    #[diagnostic(
        code(rowkit::query),
        help("Check the table schema and the criteria passed to the repository")
    )]
    QueryError(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(message)) => DbError::QueryError(message),
            other => DbError::QueryError(other.to_string()),
        }
    }
}

/// Result type alias for rowkit operations.
pub type Result<T> = std::result::Result<T, DbError>;
