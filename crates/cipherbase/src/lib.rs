//! # Cipherbase
//!
//! A multi-tenant ledger of encrypted records with owner/grantee access
//! control.
//!
//! ## Overview
//!
//! Cipherbase never sees plaintext. It stores opaque [`CiphertextHandle`]s
//! issued by an external encryption subsystem and decides who may ask that
//! subsystem to decrypt them:
//!
//! - **Databases**: named containers, each anchored by an encrypted access key
//! - **Owners**: the creator of a database; the only identity that can admit others
//! - **Members**: identities that may append records and read every record
//! - **Visibility**: every admission and append issues grants to the subsystem
//!
//! ## Key Concepts
//!
//! - **Append-only**: records are never edited or removed; membership is never revoked.
//! - **Sequential ids**: databases are numbered 1, 2, 3, ... and id 0 never exists.
//! - **Propagation cost**: admitting a member grants every existing record, so it
//!   is O(record count); appending grants every member, so it is O(member count).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cipherbase::{VaultConfig, VaultStore};
//! use cipherbase::core::{
//!     CiphertextHandle, CiphertextVerifier, ExternalCiphertext, Identity, InputProof,
//!     VerificationContext, VerifyError, VisibilityGrantor,
//! };
//! use cipherbase::store::SqliteStore;
//!
//! struct Coprocessor;
//!
//! impl CiphertextVerifier for Coprocessor {
//!     fn verify(
//!         &self,
//!         _payload: &ExternalCiphertext,
//!         _proof: &InputProof,
//!         _context: &VerificationContext,
//!     ) -> Result<CiphertextHandle, VerifyError> {
//!         Ok(CiphertextHandle::from_bytes([1; 32]))
//!     }
//! }
//!
//! impl VisibilityGrantor for Coprocessor {
//!     fn grant(&self, _handle: CiphertextHandle, _identity: Identity) {}
//!     fn grant_self(&self, _handle: CiphertextHandle) {}
//! }
//!
//! async fn example() {
//!     let coprocessor = Arc::new(Coprocessor);
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let vault = VaultStore::new(
//!         store,
//!         coprocessor.clone(),
//!         coprocessor,
//!         VaultConfig::new(Identity::from_bytes([0xee; 20])),
//!     );
//!
//!     let alice = Identity::from_bytes([0xaa; 20]);
//!     let key = ExternalCiphertext::new(vec![1, 2, 3]);
//!     let proof = InputProof::new(vec![4, 5, 6]);
//!
//!     let id = vault.create(&alice, "payroll", &key, &proof).await.unwrap();
//!     let index = vault.store_value(&alice, id, &key, &proof).await.unwrap();
//!     assert_eq!(index, 0);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `cipherbase::core` - Identifiers, events, and the external subsystem contracts
//! - `cipherbase::acl` - Membership sets, ownership index, and visibility plans
//! - `cipherbase::store` - Storage abstraction, SQLite, and in-memory backends

pub mod config;
pub mod error;
pub mod vault;

// Re-export component crates
pub use cipherbase_acl as acl;
pub use cipherbase_core as core;
pub use cipherbase_store as store;

// Re-export main types for convenience
pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use vault::{GrantOutcome, VaultStore};

// Re-export commonly used types
pub use cipherbase_core::{
    CiphertextHandle, DatabaseId, ExternalCiphertext, Identity, InputProof, JournalEntry,
    VaultEvent,
};
pub use cipherbase_store::DatabaseSummary;
