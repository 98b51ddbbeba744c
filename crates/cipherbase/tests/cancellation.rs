//! Mutations whose caller gives up mid-commit still finish completely.
//!
//! `PausingStore` parks the next commit until the test releases it, so the
//! caller's future can be dropped at a known point: after every check has
//! passed and the commit has started, before it has returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use cipherbase::store::{
    DatabaseSummary, LedgerStore, MemoryStore, Mutation, Result, SqliteStore, StoreError,
};
use cipherbase::{CiphertextHandle, DatabaseId, GrantOutcome, Identity, JournalEntry, VaultEvent};
use cipherbase_testkit::{identity, TestFixture};

struct CommitPause {
    armed: AtomicBool,
    entered: Notify,
    release: Semaphore,
}

impl CommitPause {
    fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    fn release(&self) {
        self.release.add_permits(1);
    }
}

struct PausingStore<S> {
    inner: S,
    pause: Arc<CommitPause>,
}

impl<S> PausingStore<S> {
    fn new(inner: S) -> (Self, Arc<CommitPause>) {
        let pause = Arc::new(CommitPause::new());
        let store = Self {
            inner,
            pause: Arc::clone(&pause),
        };
        (store, pause)
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for PausingStore<S> {
    async fn commit(&self, mutation: &Mutation) -> Result<JournalEntry> {
        if self.pause.armed.swap(false, Ordering::SeqCst) {
            self.pause.entered.notify_one();
            self.pause
                .release
                .acquire()
                .await
                .map_err(|e| StoreError::Task(e.to_string()))?
                .forget();
        }
        self.inner.commit(mutation).await
    }

    async fn get_database(&self, id: DatabaseId) -> Result<Option<DatabaseSummary>> {
        self.inner.get_database(id).await
    }

    async fn get_records(&self, id: DatabaseId) -> Result<Option<Vec<CiphertextHandle>>> {
        self.inner.get_records(id).await
    }

    async fn record_count(&self, id: DatabaseId) -> Result<Option<u64>> {
        self.inner.record_count(id).await
    }

    async fn get_record(&self, id: DatabaseId, index: u64) -> Result<Option<CiphertextHandle>> {
        self.inner.get_record(id, index).await
    }

    async fn is_member(&self, id: DatabaseId, identity: &Identity) -> Result<bool> {
        self.inner.is_member(id, identity).await
    }

    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<DatabaseId>> {
        self.inner.list_by_owner(owner).await
    }

    async fn database_count(&self) -> Result<u64> {
        self.inner.database_count().await
    }

    async fn events_since(&self, after_seq: u64, limit: usize) -> Result<Vec<JournalEntry>> {
        self.inner.events_since(after_seq, limit).await
    }
}

/// Run `mutation` until its commit has started, then drop it.
async fn abandon_mid_commit<F: std::future::Future>(pause: &CommitPause, mutation: F) {
    pause.arm();
    tokio::select! {
        _ = mutation => panic!("mutation finished while its commit was paused"),
        _ = pause.wait_until_entered() => {}
    }
    pause.release();
}

async fn abandoned_grant_still_propagates<S: LedgerStore>(inner: S) {
    let (store, pause) = PausingStore::new(inner);
    let fixture = TestFixture::with_store(store);
    let owner = identity(1);
    let bob = identity(2);

    let id = fixture.create_database(&owner, "db").await.unwrap();
    fixture.store(&owner, id, 11).await.unwrap();

    abandon_mid_commit(&pause, fixture.vault.grant_access(&owner, id, &bob)).await;

    // Reads wait on the gate until the detached commit has finished.
    assert!(fixture.vault.is_authorized(id, &bob).await.unwrap());
    let record = fixture.vault.record_handle(id, 0).await.unwrap();
    let access = fixture.vault.access_handle(id).await.unwrap();
    assert_eq!(fixture.coprocessor.decrypt(&record, &bob), Some(11));
    assert!(fixture.coprocessor.can_decrypt(&access, &bob));

    let retry = fixture.vault.grant_access(&owner, id, &bob).await.unwrap();
    assert_eq!(retry, GrantOutcome::AlreadyAuthorized);
}

#[tokio::test]
async fn test_abandoned_grant_still_propagates_memory() {
    abandoned_grant_still_propagates(MemoryStore::new()).await;
}

#[tokio::test]
async fn test_abandoned_grant_still_propagates_sqlite() {
    abandoned_grant_still_propagates(SqliteStore::open_memory().unwrap()).await;
}

#[tokio::test]
async fn test_abandoned_store_value_is_visible_to_every_member() {
    let (store, pause) = PausingStore::new(SqliteStore::open_memory().unwrap());
    let fixture = TestFixture::with_store(store);
    let owner = identity(1);
    let bob = identity(2);

    let id = fixture.create_database(&owner, "db").await.unwrap();
    fixture.vault.grant_access(&owner, id, &bob).await.unwrap();

    let (payload, proof) = fixture.encrypt(&bob, 42);
    abandon_mid_commit(
        &pause,
        fixture.vault.store_value(&bob, id, &payload, &proof),
    )
    .await;

    assert_eq!(fixture.vault.record_count(id).await.unwrap(), 1);
    let handle = fixture.vault.record_handle(id, 0).await.unwrap();
    assert!(fixture.coprocessor.vault_can_read(&handle));
    assert_eq!(fixture.coprocessor.decrypt(&handle, &owner), Some(42));
    assert_eq!(fixture.coprocessor.decrypt(&handle, &bob), Some(42));
}

#[tokio::test]
async fn test_abandoned_create_is_complete_and_announced() {
    let (store, pause) = PausingStore::new(MemoryStore::new());
    let fixture = TestFixture::with_store(store);
    let mut events = fixture.vault.subscribe();
    let owner = identity(1);

    let (payload, proof) = fixture.encrypt(&owner, 0);
    abandon_mid_commit(
        &pause,
        fixture.vault.create(&owner, "late", &payload, &proof),
    )
    .await;

    let id = DatabaseId::FIRST;
    let access = fixture.vault.access_handle(id).await.unwrap();
    assert!(fixture.coprocessor.vault_can_read(&access));
    assert!(fixture.coprocessor.can_decrypt(&access, &owner));
    assert_eq!(fixture.vault.list_by_owner(&owner).await.unwrap(), vec![id]);

    let entry = events.recv().await.unwrap();
    assert_eq!(
        entry.event,
        VaultEvent::DatabaseCreated {
            id,
            owner,
            name: "late".into(),
        }
    );

    // The next create continues the sequence.
    let next = fixture.create_database(&owner, "next").await.unwrap();
    assert_eq!(next, DatabaseId::new(2));
}
