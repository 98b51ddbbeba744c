//! # Cipherbase Store
//!
//! Persistence for the Cipherbase ledger. Provides a trait-based interface
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The ledger is only ever changed by three [`Mutation`]s: creating a
//! database, appending a record, and admitting a member. A backend applies
//! each mutation atomically together with its journal entry, so readers
//! never see a half-applied change and indexers can replay every event in
//! commit order.
//!
//! ## Key Types
//!
//! - [`LedgerStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and ephemeral vaults
//! - [`DatabaseSummary`] - Owner, name, access handle, and members of one database
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cipherbase_store::{LedgerStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let total = store.database_count().await.unwrap();
//!     println!("{total} databases");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Structural checks**: backends reject mutations that would skip an id,
//!   skip a record index, or admit a member twice (`StoreError::Conflict`).
//!   Policy checks (ownership, membership of the caller) belong to the vault.
//! - **Journal**: every commit returns the [`JournalEntry`] it appended.
//!
//! [`JournalEntry`]: cipherbase_core::JournalEntry

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DatabaseSummary, LedgerStore, Mutation};
