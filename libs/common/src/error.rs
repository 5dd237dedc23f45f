//! Custom error types for the common library
//!
//! This module defines the store-level error type shared by every service
//! that talks to the finance database.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// True when the store rejected a write because of a unique or foreign key
    /// constraint.
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(db_err)) => {
                db_err.is_unique_violation() || db_err.is_foreign_key_violation()
            }
            _ => false,
        }
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
