//! Ledger events for external indexers.
//!
//! Every committed mutation produces exactly one event. Events are ordered
//! by the total mutation order of the vault that emitted them.

use serde::{Deserialize, Serialize};

use crate::types::{DatabaseId, Identity};

/// An observable ledger change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VaultEvent {
    /// A database was created.
    DatabaseCreated {
        id: DatabaseId,
        owner: Identity,
        name: String,
    },

    /// A record was appended at `index`.
    RecordStored { id: DatabaseId, index: u64 },

    /// `identity` joined the authorization set.
    AccessGranted { id: DatabaseId, identity: Identity },
}

impl VaultEvent {
    /// The database this event concerns.
    pub fn database(&self) -> DatabaseId {
        match self {
            VaultEvent::DatabaseCreated { id, .. }
            | VaultEvent::RecordStored { id, .. }
            | VaultEvent::AccessGranted { id, .. } => *id,
        }
    }
}

/// An event together with its position in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Journal sequence number, starting at 1.
    pub seq: u64,
    pub event: VaultEvent,
}
