//! # Cipherbase Core
//!
//! Pure primitives for Cipherbase: identifiers, ledger events, and the
//! contracts of the external encryption subsystem.
//!
//! This crate contains no I/O, no storage, and no cryptography. Ciphertexts
//! are opaque: the core only ever sees handles returned by a
//! [`CiphertextVerifier`] and forwards visibility decisions to a
//! [`VisibilityGrantor`].
//!
//! ## Key Types
//!
//! - [`DatabaseId`] - Sequential identifier of a database (0 is never issued)
//! - [`Identity`] - Address-like caller identity with a zero sentinel
//! - [`CiphertextHandle`] - Opaque reference to an encrypted value
//! - [`VaultEvent`] - Events emitted for external indexers

pub mod error;
pub mod event;
pub mod external;
pub mod types;

pub use error::{CoreError, Result};
pub use event::{JournalEntry, VaultEvent};
pub use external::{
    CiphertextVerifier, ExternalCiphertext, InputProof, VerificationContext, VerifyError,
    VisibilityGrant, VisibilityGrantor,
};
pub use types::{CiphertextHandle, DatabaseId, Identity};
