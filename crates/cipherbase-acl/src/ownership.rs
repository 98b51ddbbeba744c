//! Ownership index: which identity created which databases.

use std::collections::HashMap;

use cipherbase_core::{DatabaseId, Identity};

use crate::error::{AclError, Result};

/// Append-only mapping from creator to the ids it created.
///
/// Each id appears exactly once, under exactly its creator, and each
/// creator's ids are kept in creation order.
#[derive(Debug, Default)]
pub struct OwnershipIndex {
    by_owner: HashMap<Identity, Vec<DatabaseId>>,
    owner_of: HashMap<DatabaseId, Identity>,
}

impl OwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` created `id`.
    pub fn record(&mut self, owner: Identity, id: DatabaseId) -> Result<()> {
        if id.is_none() {
            return Err(AclError::ReservedId);
        }
        if let Some(existing) = self.owner_of.get(&id) {
            return Err(AclError::AlreadyOwned {
                id,
                owner: *existing,
            });
        }

        let ids = self.by_owner.entry(owner).or_default();
        if let Some(&last) = ids.last() {
            if id <= last {
                return Err(AclError::OutOfOrder { id, last });
            }
        }

        ids.push(id);
        self.owner_of.insert(id, owner);
        Ok(())
    }

    /// Ids created by `owner`, oldest first. Empty if none.
    pub fn databases_of(&self, owner: &Identity) -> &[DatabaseId] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owner_of(&self, id: &DatabaseId) -> Option<&Identity> {
        self.owner_of.get(id)
    }

    /// Number of databases recorded across all owners.
    pub fn len(&self) -> usize {
        self.owner_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner_of.is_empty()
    }
}
