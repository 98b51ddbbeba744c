//! # Cipherbase Testkit
//!
//! Testing utilities for Cipherbase.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Mock coprocessor**: A deterministic verifier and grantor that remembers
//!   who may decrypt what
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cipherbase_testkit::fixtures::{identity, TestFixture};
//!
//! async fn scenario() {
//!     let fixture = TestFixture::new();
//!     let alice = identity(0xaa);
//!     let id = fixture.create_database(&alice, "payroll").await.unwrap();
//!     fixture.store(&alice, id, 1200).await.unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use cipherbase_testkit::generators::ops;
//!
//! proptest! {
//!     #[test]
//!     fn ids_stay_sequential(ops in ops(4, 64)) {
//!         // replay `ops` against a fixture and check invariants
//!     }
//! }
//! ```

pub mod coprocessor;
pub mod fixtures;
pub mod generators;

pub use coprocessor::{MockCoprocessor, REJECTED_PROOF};
pub use fixtures::{identity, multi_party_identities, random_identity, TestFixture, TestVault};
pub use generators::{op, ops, Op};
