//! LedgerStore trait: the abstract interface for ledger persistence.
//!
//! This trait allows the vault to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use cipherbase_core::{CiphertextHandle, DatabaseId, Identity, JournalEntry, VaultEvent};

use crate::error::Result;

/// One atomic change to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create database `id`. `id` must be exactly one past the current count.
    CreateDatabase {
        id: DatabaseId,
        owner: Identity,
        name: String,
        access_handle: CiphertextHandle,
        created_at: i64,
    },

    /// Append `handle` at `index`. `index` must equal the current record count.
    AppendRecord {
        id: DatabaseId,
        index: u64,
        handle: CiphertextHandle,
    },

    /// Admit `identity`. It must not already be a member.
    AddMember { id: DatabaseId, identity: Identity },
}

impl Mutation {
    /// The database this mutation targets.
    pub fn database(&self) -> DatabaseId {
        match self {
            Mutation::CreateDatabase { id, .. }
            | Mutation::AppendRecord { id, .. }
            | Mutation::AddMember { id, .. } => *id,
        }
    }

    /// The event recorded in the journal when this mutation commits.
    pub fn event(&self) -> VaultEvent {
        match self {
            Mutation::CreateDatabase {
                id, owner, name, ..
            } => VaultEvent::DatabaseCreated {
                id: *id,
                owner: *owner,
                name: name.clone(),
            },
            Mutation::AppendRecord { id, index, .. } => VaultEvent::RecordStored {
                id: *id,
                index: *index,
            },
            Mutation::AddMember { id, identity } => VaultEvent::AccessGranted {
                id: *id,
                identity: *identity,
            },
        }
    }
}

/// Everything about one database except its record handles, read under a
/// single lock or transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSummary {
    pub id: DatabaseId,
    pub owner: Identity,
    pub name: String,
    pub access_handle: CiphertextHandle,
    /// Creation time (Unix seconds).
    pub created_at: i64,
    pub record_count: u64,
    /// Authorized identities, in admission order.
    pub members: Vec<Identity>,
}

/// The LedgerStore trait: async interface for ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic commits**: a mutation and its journal entry are applied
///   together or not at all.
/// - **Append-only**: there is no operation that removes a database, a
///   record, or a member.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply `mutation` and append its event to the journal.
    ///
    /// # Returns
    /// The journal entry recorded for the mutation.
    ///
    /// # Errors
    /// - `NotFound` if the target database does not exist.
    /// - `Conflict` if the mutation does not extend the current state.
    async fn commit(&self, mutation: &Mutation) -> Result<JournalEntry>;

    // ─────────────────────────────────────────────────────────────────────────
    // Database Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the summary of a database.
    async fn get_database(&self, id: DatabaseId) -> Result<Option<DatabaseSummary>>;

    /// All record handles of a database by index, or `None` if it does not
    /// exist.
    async fn get_records(&self, id: DatabaseId) -> Result<Option<Vec<CiphertextHandle>>>;

    /// Number of records in a database, or `None` if it does not exist.
    async fn record_count(&self, id: DatabaseId) -> Result<Option<u64>>;

    /// Handle stored at `index`, or `None` if the database or index is absent.
    async fn get_record(&self, id: DatabaseId, index: u64) -> Result<Option<CiphertextHandle>>;

    /// Whether `identity` is a member. False for unknown databases.
    async fn is_member(&self, id: DatabaseId, identity: &Identity) -> Result<bool>;

    /// Ids created by `owner`, oldest first.
    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<DatabaseId>>;

    /// Number of databases ever created.
    async fn database_count(&self) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Journal
    // ─────────────────────────────────────────────────────────────────────────

    /// Journal entries with `seq > after_seq`, oldest first, at most `limit`.
    async fn events_since(&self, after_seq: u64, limit: usize) -> Result<Vec<JournalEntry>>;
}
