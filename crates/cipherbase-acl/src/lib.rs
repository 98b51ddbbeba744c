//! # Cipherbase Access Control
//!
//! Pure data structures behind per-database access control.
//!
//! ## Overview
//!
//! Access in Cipherbase is additive. A database starts with its owner as the
//! only member; the owner may admit further identities, and nobody is ever
//! removed. Every member may request decryption of the database's access
//! handle and of every record handle in it, including records written before
//! the member was admitted.
//!
//! ## Key Concepts
//!
//! - **AuthorizationSet**: membership set plus insertion-ordered member list
//! - **OwnershipIndex**: creator -> database ids, in creation order
//! - **VisibilityPlan**: the explicit batch of visibility grants a mutation
//!   must issue to the external encryption subsystem
//!
//! ## Propagation Cost
//!
//! Admitting a member to a database with `n` records produces a plan with
//! `n + 1` grants (access handle plus every record). Appending a record to a
//! database with `m` members produces `m + 1` grants (members plus the vault
//! itself). Plans expose their size so callers can log and meter the cost.

pub mod authorization;
pub mod error;
pub mod ownership;
pub mod visibility;

pub use authorization::AuthorizationSet;
pub use error::{AclError, Result};
pub use ownership::OwnershipIndex;
pub use visibility::VisibilityPlan;
