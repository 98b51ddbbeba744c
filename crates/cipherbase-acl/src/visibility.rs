//! Visibility propagation plans.
//!
//! A plan is the complete list of grants one mutation owes the external
//! encryption subsystem. Building the list up front keeps the cost of a
//! mutation visible: its length is the number of external calls.

use cipherbase_core::{CiphertextHandle, Identity, VisibilityGrant, VisibilityGrantor};

/// An ordered batch of visibility grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityPlan {
    grants: Vec<VisibilityGrant>,
}

impl VisibilityPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants owed when a database is created: the vault and the owner may
    /// both read the access handle.
    pub fn for_new_database(access_handle: CiphertextHandle, owner: Identity) -> Self {
        let mut plan = Self::new();
        plan.push_vault(access_handle);
        plan.push(access_handle, owner);
        plan
    }

    /// Grants owed when `identity` joins a database.
    ///
    /// The new member gains the access handle (when initialized) and every
    /// record already stored. This is O(n) in the number of records.
    pub fn for_new_member(
        identity: Identity,
        access_handle: CiphertextHandle,
        records: &[CiphertextHandle],
    ) -> Self {
        let mut plan = Self {
            grants: Vec::with_capacity(records.len() + 1),
        };
        if access_handle.is_initialized() {
            plan.push(access_handle, identity);
        }
        for &handle in records {
            plan.push(handle, identity);
        }
        plan
    }

    /// Grants owed when a record is appended: the vault, the owner, and every
    /// other current member may read the new handle.
    pub fn for_new_record(handle: CiphertextHandle, owner: Identity, members: &[Identity]) -> Self {
        let mut plan = Self {
            grants: Vec::with_capacity(members.len() + 2),
        };
        plan.push_vault(handle);
        plan.push(handle, owner);
        for &member in members.iter().filter(|m| **m != owner) {
            plan.push(handle, member);
        }
        plan
    }

    fn push(&mut self, handle: CiphertextHandle, identity: Identity) {
        self.grants
            .push(VisibilityGrant::Identity { handle, identity });
    }

    fn push_vault(&mut self, handle: CiphertextHandle) {
        self.grants.push(VisibilityGrant::Vault { handle });
    }

    pub fn grants(&self) -> &[VisibilityGrant] {
        &self.grants
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Issue every grant through `grantor`, in order. Returns the number of
    /// grants issued.
    pub fn apply<G: VisibilityGrantor + ?Sized>(&self, grantor: &G) -> usize {
        if !self.grants.is_empty() {
            grantor.grant_batch(&self.grants);
        }
        self.grants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(byte: u8) -> Identity {
        Identity::from_bytes([byte; 20])
    }

    fn handle(byte: u8) -> CiphertextHandle {
        CiphertextHandle::from_bytes([byte; 32])
    }

    #[test]
    fn test_new_database_plan() {
        let plan = VisibilityPlan::for_new_database(handle(1), identity(1));
        assert_eq!(
            plan.grants(),
            &[
                VisibilityGrant::Vault { handle: handle(1) },
                VisibilityGrant::Identity {
                    handle: handle(1),
                    identity: identity(1)
                },
            ]
        );
    }

    #[test]
    fn test_new_member_covers_history() {
        let records = [handle(10), handle(11), handle(12)];
        let plan = VisibilityPlan::for_new_member(identity(2), handle(1), &records);

        assert_eq!(plan.len(), 4);
        let handles: Vec<_> = plan.grants().iter().map(|g| g.handle()).collect();
        assert_eq!(handles, vec![handle(1), handle(10), handle(11), handle(12)]);
        assert!(plan.grants().iter().all(|g| matches!(
            g,
            VisibilityGrant::Identity { identity: who, .. } if *who == identity(2)
        )));
    }

    #[test]
    fn test_new_member_skips_uninitialized_access_handle() {
        let plan = VisibilityPlan::for_new_member(identity(2), CiphertextHandle::ZERO, &[handle(10)]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.grants()[0].handle(), handle(10));
    }

    #[test]
    fn test_new_member_on_empty_database() {
        let plan = VisibilityPlan::for_new_member(identity(2), CiphertextHandle::ZERO, &[]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_new_record_reaches_every_member_once() {
        let members = [identity(1), identity(2), identity(3)];
        let plan = VisibilityPlan::for_new_record(handle(7), identity(1), &members);

        // vault + owner + two other members
        assert_eq!(plan.len(), 4);
        let owner_grants = plan
            .grants()
            .iter()
            .filter(|g| matches!(g, VisibilityGrant::Identity { identity: who, .. } if *who == identity(1)))
            .count();
        assert_eq!(owner_grants, 1);
    }
}
