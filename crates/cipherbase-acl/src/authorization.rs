//! Per-database authorization sets.

use std::collections::HashSet;

use cipherbase_core::Identity;

use crate::error::{AclError, Result};

/// Identities allowed to decrypt a database's handles and to write records.
///
/// Kept twice: a hash set for membership tests and a vector that preserves
/// admission order for enumeration. Both are only touched by [`insert`],
/// so they cannot drift apart.
///
/// [`insert`]: AuthorizationSet::insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationSet {
    lookup: HashSet<Identity>,
    ordered: Vec<Identity>,
}

impl AuthorizationSet {
    /// Create a set whose only member is `owner`.
    pub fn with_owner(owner: Identity) -> Result<Self> {
        let mut set = Self::default();
        set.insert(owner)?;
        Ok(set)
    }

    /// Admit `identity`.
    ///
    /// Returns `Ok(false)` when the identity was already a member; the set is
    /// left untouched in that case.
    pub fn insert(&mut self, identity: Identity) -> Result<bool> {
        if identity.is_zero() {
            return Err(AclError::ZeroIdentity);
        }
        if !self.lookup.insert(identity) {
            return Ok(false);
        }
        self.ordered.push(identity);
        Ok(true)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.lookup.contains(identity)
    }

    /// Members in admission order.
    pub fn members(&self) -> &[Identity] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.ordered.iter()
    }
}
