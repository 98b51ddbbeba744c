//! The VaultStore: access control and record propagation over a ledger.
//!
//! The vault owns one [`LedgerStore`] and the two collaborators of the
//! external encryption subsystem. It is the only component that decides
//! who may do what; the store underneath only checks structure.

use std::sync::Arc;

use tokio::sync::{broadcast, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info, warn};

use cipherbase_acl::VisibilityPlan;
use cipherbase_core::{
    CiphertextHandle, CiphertextVerifier, DatabaseId, ExternalCiphertext, Identity, InputProof,
    JournalEntry, VerificationContext, VisibilityGrantor,
};
use cipherbase_store::{DatabaseSummary, LedgerStore, Mutation, StoreError};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

/// Outcome of [`VaultStore::grant_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The identity was admitted. `visibility_grants` is the number of
    /// handles it gained, which grows with the database's record count.
    Granted { visibility_grants: usize },
    /// The identity was already a member; nothing changed.
    AlreadyAuthorized,
}

/// Multi-tenant ledger of encrypted records.
///
/// Provides a unified API for:
/// - Creating databases anchored by an encrypted access handle
/// - Admitting members (owner only)
/// - Appending encrypted records (any member)
/// - Reading handles and membership
///
/// # Serialization
///
/// Mutations hold the write half of a single gate from their first check
/// until the store commit and every visibility grant have completed, so
/// all mutations on one vault are totally ordered. Reads hold the read
/// half and never observe a committed change whose grants are still
/// outstanding.
///
/// Once a mutation's checks pass, the commit, its grants, and its event run
/// on a spawned task that owns the write guard. Dropping the caller's future
/// after that point does not abandon the grants.
///
/// The backend is never handed out, so nothing can commit around the gate:
///
/// ```compile_fail
/// use cipherbase::core::{CiphertextVerifier, VisibilityGrantor};
/// use cipherbase::store::MemoryStore;
/// use cipherbase::VaultStore;
///
/// fn backend<V, G>(vault: &VaultStore<MemoryStore, V, G>) -> &MemoryStore
/// where
///     V: CiphertextVerifier,
///     G: VisibilityGrantor + 'static,
/// {
///     vault.store()
/// }
/// ```
pub struct VaultStore<S, V, G>
where
    S: LedgerStore,
    V: CiphertextVerifier,
    G: VisibilityGrantor,
{
    /// The storage backend.
    store: Arc<S>,
    /// Turns external payloads into handles.
    verifier: V,
    /// Records decryption eligibility.
    grantor: Arc<G>,
    /// Configuration.
    config: VaultConfig,
    gate: Arc<RwLock<()>>,
    /// Live event feed; the durable copy lives in the store's journal.
    events: broadcast::Sender<JournalEntry>,
}

impl<S, V, G> VaultStore<S, V, G>
where
    S: LedgerStore,
    V: CiphertextVerifier,
    G: VisibilityGrantor + 'static,
{
    /// Create a new vault over `store`.
    pub fn new(store: S, verifier: V, grantor: G, config: VaultConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            store: Arc::new(store),
            verifier,
            grantor: Arc::new(grantor),
            config,
            gate: Arc::new(RwLock::new(())),
            events,
        }
    }

    /// The vault's own identity.
    pub fn vault_identity(&self) -> Identity {
        self.config.vault_identity
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Subscribe to events committed from now on.
    ///
    /// Subscribers that fall behind by more than the configured capacity
    /// lose events; they can catch up with [`events_since`](Self::events_since).
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEntry> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a database owned by `caller`.
    ///
    /// `payload` and `proof` carry the encrypted access key. On success the
    /// vault and `caller` can both read the resulting access handle.
    pub async fn create(
        &self,
        caller: &Identity,
        name: &str,
        payload: &ExternalCiphertext,
        proof: &InputProof,
    ) -> Result<DatabaseId> {
        if name.is_empty() {
            return Err(VaultError::EmptyName);
        }
        if name.len() > self.config.max_name_len {
            return Err(VaultError::NameTooLong {
                len: name.len(),
                max: self.config.max_name_len,
            });
        }
        if caller.is_zero() {
            return Err(VaultError::InvalidIdentity);
        }

        let guard = Arc::clone(&self.gate).write_owned().await;

        let access_handle = self.verify(caller, payload, proof)?;
        let id = DatabaseId::new(self.store.database_count().await?).next();

        let mutation = Mutation::CreateDatabase {
            id,
            owner: *caller,
            name: name.to_string(),
            access_handle,
            created_at: now_secs(),
        };
        let plan = VisibilityPlan::for_new_database(access_handle, *caller);
        self.commit_and_grant(guard, mutation, plan).await?;

        info!(database = %id, owner = %caller, name, "database created");
        Ok(id)
    }

    /// Admit `identity` to database `id`. Only the owner may do this.
    ///
    /// The new member gains visibility over the access handle and over every
    /// record already stored, so the cost is O(record count). Admitting an
    /// existing member is a successful no-op.
    pub async fn grant_access(
        &self,
        caller: &Identity,
        id: DatabaseId,
        identity: &Identity,
    ) -> Result<GrantOutcome> {
        let guard = Arc::clone(&self.gate).write_owned().await;

        let db = self.require_database(id).await?;
        if identity.is_zero() {
            return Err(VaultError::InvalidIdentity);
        }
        if db.owner != *caller {
            warn!(database = %id, caller = %caller, "grant refused: not owner");
            return Err(VaultError::NotOwner {
                database: id,
                caller: *caller,
            });
        }
        if self.store.is_member(id, identity).await? {
            debug!(database = %id, identity = %identity, "grant skipped: already authorized");
            return Ok(GrantOutcome::AlreadyAuthorized);
        }

        let records = self
            .store
            .get_records(id)
            .await?
            .ok_or(VaultError::NotFound(id))?;

        let mutation = Mutation::AddMember {
            id,
            identity: *identity,
        };
        let plan = VisibilityPlan::for_new_member(*identity, db.access_handle, &records);
        let visibility_grants = self.commit_and_grant(guard, mutation, plan).await?;

        info!(
            database = %id,
            identity = %identity,
            records = records.len(),
            visibility_grants,
            "access granted"
        );
        Ok(GrantOutcome::Granted { visibility_grants })
    }

    /// Append an encrypted value to database `id`. Any member may write.
    ///
    /// Returns the index of the new record. The vault, the owner, and every
    /// current member gain visibility over it.
    pub async fn store_value(
        &self,
        caller: &Identity,
        id: DatabaseId,
        payload: &ExternalCiphertext,
        proof: &InputProof,
    ) -> Result<u64> {
        let guard = Arc::clone(&self.gate).write_owned().await;

        let db = self.require_database(id).await?;
        if !self.store.is_member(id, caller).await? {
            warn!(database = %id, caller = %caller, "write refused: not authorized");
            return Err(VaultError::Unauthorized {
                database: id,
                caller: *caller,
            });
        }

        let handle = self.verify(caller, payload, proof)?;
        let index = db.record_count;

        let mutation = Mutation::AppendRecord { id, index, handle };
        let plan = VisibilityPlan::for_new_record(handle, db.owner, &db.members);
        let visibility_grants = self.commit_and_grant(guard, mutation, plan).await?;

        debug!(database = %id, index, visibility_grants, "record stored");
        Ok(index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Owner, name, access handle, creation time, record count, and members.
    pub async fn get_database(&self, id: DatabaseId) -> Result<DatabaseSummary> {
        let _guard = self.gate.read().await;
        self.require_database(id).await
    }

    pub async fn access_handle(&self, id: DatabaseId) -> Result<CiphertextHandle> {
        Ok(self.get_database(id).await?.access_handle)
    }

    /// Every record handle, by index.
    pub async fn record_handles(&self, id: DatabaseId) -> Result<Vec<CiphertextHandle>> {
        let _guard = self.gate.read().await;
        self.store
            .get_records(id)
            .await?
            .ok_or(VaultError::NotFound(id))
    }

    /// The record handle at `index`.
    pub async fn record_handle(&self, id: DatabaseId, index: u64) -> Result<CiphertextHandle> {
        let _guard = self.gate.read().await;

        let count = self
            .store
            .record_count(id)
            .await?
            .ok_or(VaultError::NotFound(id))?;
        if index >= count {
            return Err(VaultError::IndexOutOfRange {
                database: id,
                index,
                count,
            });
        }

        self.store
            .get_record(id, index)
            .await?
            .ok_or(VaultError::IndexOutOfRange {
                database: id,
                index,
                count,
            })
    }

    pub async fn record_count(&self, id: DatabaseId) -> Result<u64> {
        let _guard = self.gate.read().await;
        self.store
            .record_count(id)
            .await?
            .ok_or(VaultError::NotFound(id))
    }

    /// Members of `id`, in admission order.
    pub async fn authorized_identities(&self, id: DatabaseId) -> Result<Vec<Identity>> {
        Ok(self.get_database(id).await?.members)
    }

    /// Whether `identity` is a member of `id`. False for unknown databases.
    pub async fn is_authorized(&self, id: DatabaseId, identity: &Identity) -> Result<bool> {
        let _guard = self.gate.read().await;
        Ok(self.store.is_member(id, identity).await?)
    }

    /// Databases created by `owner`, oldest first.
    pub async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<DatabaseId>> {
        let _guard = self.gate.read().await;
        Ok(self.store.list_by_owner(owner).await?)
    }

    /// Number of databases ever created; equals the highest id issued.
    pub async fn total_databases(&self) -> Result<u64> {
        let _guard = self.gate.read().await;
        Ok(self.store.database_count().await?)
    }

    /// Journal entries after `after_seq`, for indexers replaying history.
    pub async fn events_since(&self, after_seq: u64, limit: usize) -> Result<Vec<JournalEntry>> {
        let _guard = self.gate.read().await;
        Ok(self.store.events_since(after_seq, limit).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn require_database(&self, id: DatabaseId) -> Result<DatabaseSummary> {
        self.store
            .get_database(id)
            .await?
            .ok_or(VaultError::NotFound(id))
    }

    fn verify(
        &self,
        caller: &Identity,
        payload: &ExternalCiphertext,
        proof: &InputProof,
    ) -> Result<CiphertextHandle> {
        let context = VerificationContext {
            vault: self.config.vault_identity,
            caller: *caller,
        };
        self.verifier
            .verify(payload, proof, &context)
            .map_err(|e| {
                warn!(caller = %caller, error = %e, "ciphertext rejected");
                VaultError::InvalidCiphertext(e.to_string())
            })
    }

    /// Commit `mutation`, issue `plan`, and publish the event on a spawned
    /// task that owns `guard`. Returns the number of grants issued.
    ///
    /// The task runs to completion even if the returned future is dropped,
    /// so a committed change always has its grants.
    async fn commit_and_grant(
        &self,
        guard: OwnedRwLockWriteGuard<()>,
        mutation: Mutation,
        plan: VisibilityPlan,
    ) -> Result<usize> {
        let store = Arc::clone(&self.store);
        let grantor = Arc::clone(&self.grantor);
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let entry = store.commit(&mutation).await?;
            let visibility_grants = plan.apply(&*grantor);
            // No live subscribers is fine; the journal keeps the event.
            let _ = events.send(entry);
            drop(guard);
            Ok::<_, StoreError>(visibility_grants)
        });

        let visibility_grants = task
            .await
            .map_err(|e| StoreError::Task(format!("commit task failed: {e}")))??;
        Ok(visibility_grants)
    }
}

/// Get current time in Unix seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
