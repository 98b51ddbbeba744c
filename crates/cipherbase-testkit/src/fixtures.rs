//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use cipherbase::{Result, VaultConfig, VaultStore};
use cipherbase_core::{DatabaseId, ExternalCiphertext, Identity, InputProof, VerificationContext};
use cipherbase_store::{LedgerStore, MemoryStore};
use rand::RngCore;

use crate::coprocessor::MockCoprocessor;

/// The vault identity every fixture uses.
pub const VAULT_IDENTITY: Identity = Identity::from_bytes([0xee; 20]);

/// A vault wired to a shared [`MockCoprocessor`].
pub type TestVault<S> = VaultStore<S, Arc<MockCoprocessor>, Arc<MockCoprocessor>>;

/// A test fixture with a vault and the coprocessor behind it.
pub struct TestFixture<S: LedgerStore = MemoryStore> {
    pub vault: TestVault<S>,
    pub coprocessor: Arc<MockCoprocessor>,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerStore> TestFixture<S> {
    /// Create a fixture over an existing store.
    pub fn with_store(store: S) -> Self {
        let coprocessor = Arc::new(MockCoprocessor::new());
        let vault = VaultStore::new(
            store,
            coprocessor.clone(),
            coprocessor.clone(),
            VaultConfig::new(VAULT_IDENTITY),
        );
        Self { vault, coprocessor }
    }

    /// The verification context for `caller` on this fixture's vault.
    pub fn context(&self, caller: &Identity) -> VerificationContext {
        VerificationContext {
            vault: self.vault.vault_identity(),
            caller: *caller,
        }
    }

    /// Encrypt `value` so that `caller` can present it to the vault.
    pub fn encrypt(&self, caller: &Identity, value: u64) -> (ExternalCiphertext, InputProof) {
        self.coprocessor.encrypt(value, &self.context(caller))
    }

    /// Create a database whose access key encrypts `value`.
    pub async fn create_database(&self, owner: &Identity, name: &str) -> Result<DatabaseId> {
        let (payload, proof) = self.encrypt(owner, 0);
        self.vault.create(owner, name, &payload, &proof).await
    }

    /// Encrypt and store `value` as `caller`.
    pub async fn store(&self, caller: &Identity, id: DatabaseId, value: u64) -> Result<u64> {
        let (payload, proof) = self.encrypt(caller, value);
        self.vault.store_value(caller, id, &payload, &proof).await
    }
}

/// A deterministic identity with every byte set to `byte`.
pub fn identity(byte: u8) -> Identity {
    Identity::from_bytes([byte; 20])
}

/// A random, non-zero identity.
pub fn random_identity() -> Identity {
    let mut bytes = [0u8; 20];
    loop {
        rand::thread_rng().fill_bytes(&mut bytes);
        let identity = Identity::from_bytes(bytes);
        if !identity.is_zero() {
            return identity;
        }
    }
}

/// `count` distinct deterministic identities for multi-party tests.
pub fn multi_party_identities(count: usize) -> Vec<Identity> {
    (0..count)
        .map(|i| {
            let mut bytes = [0u8; 20];
            bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            Identity::from_bytes(bytes)
        })
        .collect()
}
