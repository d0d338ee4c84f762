//! # Database Error Types
//!
//! `sqlx::Error` is folded into [`DbError`] at the repository boundary, and
//! [`DbError`] is folded into [`SettlementError`] when the store acts as the
//! checkout's transaction service. The session never sees sqlx types.

use thiserror::Error;
use till_checkout::SettlementError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the row, e.g. a transaction code collision.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Refused by `record` before any SQL ran, or by a CHECK constraint.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The file could not be opened or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// COMMIT did not go through.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything else, including stored values that no longer decode.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// SQLite reports constraint failures only through the message text, so
/// the constraint kind is read from it.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::InvalidData(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Maps storage failures onto the settlement contract.
///
/// Constraint and data problems are rejections; everything else means the
/// store could not do its job right now.
impl From<DbError> for SettlementError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. }
            | DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::InvalidData(_) => SettlementError::Rejected(err.to_string()),
            other => SettlementError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
