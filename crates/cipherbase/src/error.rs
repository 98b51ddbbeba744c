//! Error types for the vault.

use cipherbase_core::{DatabaseId, Identity};
use cipherbase_store::StoreError;
use thiserror::Error;

/// Errors that can occur during vault operations.
///
/// Every check runs before any state changes, so an error always means the
/// ledger is exactly as it was before the call.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No database with this id.
    #[error("database not found: {0}")]
    NotFound(DatabaseId),

    /// Database names must be non-empty.
    #[error("database name is empty")]
    EmptyName,

    /// Database name exceeds the configured limit.
    #[error("database name is {len} bytes, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// The zero identity cannot own, write, or be granted anything.
    #[error("invalid identity")]
    InvalidIdentity,

    /// Only the owner may grant access.
    #[error("{caller} is not the owner of database {database}")]
    NotOwner {
        database: DatabaseId,
        caller: Identity,
    },

    /// Only members may store records.
    #[error("{caller} is not authorized on database {database}")]
    Unauthorized {
        database: DatabaseId,
        caller: Identity,
    },

    /// The external verifier rejected the payload or proof.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Record index at or past the record count.
    #[error("record index {index} out of range for database {database} ({count} records)")]
    IndexOutOfRange {
        database: DatabaseId,
        index: u64,
        count: u64,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
