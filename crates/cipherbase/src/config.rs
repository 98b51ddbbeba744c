//! Vault configuration.

use cipherbase_core::Identity;

/// Default capacity of the live event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Default maximum database name length in bytes.
pub const DEFAULT_MAX_NAME_LEN: usize = 256;

/// Configuration for a [`VaultStore`](crate::VaultStore).
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// The vault's own identity. Binds verification contexts to this
    /// instance and is the grantee of `grant_self` calls.
    pub vault_identity: Identity,
    /// Buffered events per live subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Maximum database name length in bytes.
    pub max_name_len: usize,
}

impl VaultConfig {
    pub fn new(vault_identity: Identity) -> Self {
        Self {
            vault_identity,
            ..Self::default()
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_identity: Identity::ZERO,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}
