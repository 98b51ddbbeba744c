//! Error types for the access-control structures.

use cipherbase_core::{DatabaseId, Identity};
use thiserror::Error;

/// Errors raised when an update would break an access-control invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AclError {
    /// The zero identity can never be a member.
    #[error("zero identity cannot be authorized")]
    ZeroIdentity,

    /// The database already has an owner.
    #[error("database {id} is already owned by {owner}")]
    AlreadyOwned { id: DatabaseId, owner: Identity },

    /// Ids must be recorded in creation order.
    #[error("database {id} recorded out of order (last was {last})")]
    OutOfOrder { id: DatabaseId, last: DatabaseId },

    /// The sentinel id was presented as a real database.
    #[error("database id 0 is reserved")]
    ReservedId,
}

/// Result type for access-control operations.
pub type Result<T> = std::result::Result<T, AclError>;
