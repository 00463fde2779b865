//! Error types for metadata operations.

use thiserror::Error;

/// Errors that can occur during metadata operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The referenced workspace row does not exist.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    /// A stored record violates a structural invariant.
    #[error("corrupt record {table}#{id}: {reason}")]
    Corrupt {
        table: &'static str,
        id: i64,
        reason: String,
    },

    /// The backing database failed or could not be reached.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("metadata store poisoned: {0}")]
    Poisoned(String),
}

/// Convenience type alias for metadata operations.
pub type MetaResult<T> = std::result::Result<T, MetaError>;
