//! Repository Module
//!
//! CRUD and query operations over the SQLite pool, one module per table
//! family. Functions are free functions taking `&SqlitePool`; timestamps are
//! `i64` Unix millis supplied by callers or `utils::time`.

pub mod campaign;
pub mod customer;
pub mod usage;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
