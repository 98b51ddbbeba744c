//! Error types for the store module.

use cipherbase_acl::AclError;
use cipherbase_core::DatabaseId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Journal serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Mutation targets a database that does not exist.
    #[error("database not found: {0}")]
    NotFound(DatabaseId),

    /// Mutation does not fit the current ledger state.
    #[error("conflict on database {id}: {reason}")]
    Conflict { id: DatabaseId, reason: String },

    /// Access-control invariant violated.
    #[error("access control: {0}")]
    Acl(#[from] AclError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding backend state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),

    /// Blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub(crate) fn conflict(id: DatabaseId, reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            id,
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
