//! Proptest generators for property-based testing.

use proptest::prelude::*;

use cipherbase_core::{CiphertextHandle, DatabaseId, Identity};

/// Generate a random non-zero Identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 20]>()
        .prop_map(Identity::from_bytes)
        .prop_filter("zero identity", |identity| !identity.is_zero())
}

/// Generate a random initialized CiphertextHandle.
pub fn handle() -> impl Strategy<Value = CiphertextHandle> {
    any::<[u8; 32]>()
        .prop_map(CiphertextHandle::from_bytes)
        .prop_filter("zero handle", |handle| handle.is_initialized())
}

/// Generate a valid database id (1-indexed).
pub fn database_id() -> impl Strategy<Value = DatabaseId> {
    (1u64..=u64::MAX).prop_map(DatabaseId::new)
}

/// Generate a database name.
pub fn database_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// One vault operation, addressed by small indices.
///
/// `actor` and `target` index into a fixed party list and `database` is
/// reduced modulo the number of databases created so far, so every generated
/// sequence is meaningful against any vault. Some operations will be refused
/// (non-owners granting, non-members storing); that is intended.
#[derive(Debug, Clone)]
pub enum Op {
    Create { actor: usize, name: String },
    Grant { actor: usize, database: usize, target: usize },
    Store { actor: usize, database: usize, value: u64 },
}

/// Generate one operation over `parties` identities.
pub fn op(parties: usize) -> impl Strategy<Value = Op> {
    let party = 0..parties.max(1);
    prop_oneof![
        1 => (party.clone(), database_name()).prop_map(|(actor, name)| Op::Create { actor, name }),
        2 => (party.clone(), any::<usize>(), party.clone()).prop_map(|(actor, database, target)| {
            Op::Grant { actor, database, target }
        }),
        3 => (party, any::<usize>(), any::<u64>()).prop_map(|(actor, database, value)| {
            Op::Store { actor, database, value }
        }),
    ]
}

/// Generate up to `max_len` operations over `parties` identities.
pub fn ops(parties: usize, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(parties), 1..=max_len.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_identities_are_non_zero(identity in identity()) {
            prop_assert!(!identity.is_zero());
        }

        #[test]
        fn generated_ops_stay_in_party_range(ops in ops(4, 32)) {
            for op in ops {
                match op {
                    Op::Create { actor, name } => {
                        prop_assert!(actor < 4);
                        prop_assert!(!name.is_empty());
                    }
                    Op::Grant { actor, target, .. } => {
                        prop_assert!(actor < 4 && target < 4);
                    }
                    Op::Store { actor, .. } => prop_assert!(actor < 4),
                }
            }
        }
    }
}
