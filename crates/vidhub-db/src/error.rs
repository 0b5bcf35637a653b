//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated (carries the constraint name when known)
    #[error("unique constraint violated: {0}")]
    Conflict(String),
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.constraint().unwrap_or("unique").to_string());
            }
        }
        Self::Sqlx(err)
    }
}
