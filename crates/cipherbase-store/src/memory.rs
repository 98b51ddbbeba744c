//! In-memory implementation of the LedgerStore trait.
//!
//! Same semantics as SQLite but keeps everything in memory with no
//! persistence. Used by tests and by vaults that do not need durability.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use cipherbase_acl::{AuthorizationSet, OwnershipIndex};
use cipherbase_core::{CiphertextHandle, DatabaseId, Identity, JournalEntry};

use crate::error::{Result, StoreError};
use crate::traits::{DatabaseSummary, LedgerStore, Mutation};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// commit runs under one write guard.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Databases indexed by id.
    databases: BTreeMap<DatabaseId, StoredDatabase>,

    /// Creator -> ids.
    owners: OwnershipIndex,

    /// Event journal; entry `i` has seq `i + 1`.
    journal: Vec<JournalEntry>,
}

struct StoredDatabase {
    owner: Identity,
    name: String,
    access_handle: CiphertextHandle,
    created_at: i64,
    records: Vec<CiphertextHandle>,
    members: AuthorizationSet,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::CreateDatabase {
                id,
                owner,
                name,
                access_handle,
                created_at,
            } => {
                let expected = DatabaseId::new(self.databases.len() as u64 + 1);
                if *id != expected {
                    return Err(StoreError::conflict(
                        *id,
                        format!("next database id is {}", expected.get()),
                    ));
                }

                // Both fallible steps run before anything is inserted.
                let members = AuthorizationSet::with_owner(*owner)?;
                self.owners.record(*owner, *id)?;

                self.databases.insert(
                    *id,
                    StoredDatabase {
                        owner: *owner,
                        name: name.clone(),
                        access_handle: *access_handle,
                        created_at: *created_at,
                        records: Vec::new(),
                        members,
                    },
                );
            }
            Mutation::AppendRecord { id, index, handle } => {
                let db = self
                    .databases
                    .get_mut(id)
                    .ok_or(StoreError::NotFound(*id))?;
                let next = db.records.len() as u64;
                if *index != next {
                    return Err(StoreError::conflict(
                        *id,
                        format!("next record index is {next}, got {index}"),
                    ));
                }
                db.records.push(*handle);
            }
            Mutation::AddMember { id, identity } => {
                let db = self
                    .databases
                    .get_mut(id)
                    .ok_or(StoreError::NotFound(*id))?;
                if !db.members.insert(*identity)? {
                    return Err(StoreError::conflict(
                        *id,
                        format!("{identity} is already a member"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn commit(&self, mutation: &Mutation) -> Result<JournalEntry> {
        let mut inner = self.write()?;
        inner.apply(mutation)?;

        let entry = JournalEntry {
            seq: inner.journal.len() as u64 + 1,
            event: mutation.event(),
        };
        inner.journal.push(entry.clone());

        debug!(seq = entry.seq, database = %mutation.database(), "memory store commit");
        Ok(entry)
    }

    async fn get_database(&self, id: DatabaseId) -> Result<Option<DatabaseSummary>> {
        let inner = self.read()?;
        Ok(inner.databases.get(&id).map(|db| DatabaseSummary {
            id,
            owner: db.owner,
            name: db.name.clone(),
            access_handle: db.access_handle,
            created_at: db.created_at,
            record_count: db.records.len() as u64,
            members: db.members.members().to_vec(),
        }))
    }

    async fn get_records(&self, id: DatabaseId) -> Result<Option<Vec<CiphertextHandle>>> {
        let inner = self.read()?;
        Ok(inner.databases.get(&id).map(|db| db.records.clone()))
    }

    async fn record_count(&self, id: DatabaseId) -> Result<Option<u64>> {
        let inner = self.read()?;
        Ok(inner.databases.get(&id).map(|db| db.records.len() as u64))
    }

    async fn get_record(&self, id: DatabaseId, index: u64) -> Result<Option<CiphertextHandle>> {
        let inner = self.read()?;
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(inner
            .databases
            .get(&id)
            .and_then(|db| db.records.get(index).copied()))
    }

    async fn is_member(&self, id: DatabaseId, identity: &Identity) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner
            .databases
            .get(&id)
            .is_some_and(|db| db.members.contains(identity)))
    }

    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<DatabaseId>> {
        let inner = self.read()?;
        Ok(inner.owners.databases_of(owner).to_vec())
    }

    async fn database_count(&self) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.databases.len() as u64)
    }

    async fn events_since(&self, after_seq: u64, limit: usize) -> Result<Vec<JournalEntry>> {
        let inner = self.read()?;
        let start = usize::try_from(after_seq).unwrap_or(usize::MAX);
        Ok(inner
            .journal
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }
}
