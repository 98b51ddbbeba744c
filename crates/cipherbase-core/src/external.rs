//! Contracts of the external encryption subsystem.
//!
//! The ledger never sees plaintext. Encrypted inputs arrive as an
//! [`ExternalCiphertext`] plus an [`InputProof`]; a [`CiphertextVerifier`]
//! turns them into an internal [`CiphertextHandle`] or rejects them. Who may
//! later ask the subsystem to decrypt a handle is recorded through a
//! [`VisibilityGrantor`].

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CiphertextHandle, Identity};

/// An externally encrypted payload, opaque to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCiphertext(pub Bytes);

impl ExternalCiphertext {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Validity proof accompanying an [`ExternalCiphertext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(pub Bytes);

impl InputProof {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Binds a verification to one vault instance and one caller, so a payload
/// accepted in one context cannot be replayed in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerificationContext {
    /// The identity of the vault performing the verification.
    pub vault: Identity,
    /// The identity that presented the payload.
    pub caller: Identity,
}

/// Rejection reported by a [`CiphertextVerifier`].
///
/// A rejection is permanent for that call; the ledger never retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("proof rejected: {0}")]
    ProofRejected(String),

    #[error("context mismatch")]
    ContextMismatch,
}

/// Turns an external payload and proof into an internal handle.
pub trait CiphertextVerifier: Send + Sync {
    fn verify(
        &self,
        payload: &ExternalCiphertext,
        proof: &InputProof,
        context: &VerificationContext,
    ) -> Result<CiphertextHandle, VerifyError>;
}

/// A single visibility extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityGrant {
    /// The vault itself may read the handle for bookkeeping.
    Vault { handle: CiphertextHandle },
    /// An identity may request decryption of the handle.
    Identity {
        handle: CiphertextHandle,
        identity: Identity,
    },
}

impl VisibilityGrant {
    pub fn handle(&self) -> CiphertextHandle {
        match self {
            VisibilityGrant::Vault { handle } | VisibilityGrant::Identity { handle, .. } => *handle,
        }
    }
}

/// Records decryption eligibility in the external subsystem.
///
/// Grants are additive and infallible from the ledger's point of view.
pub trait VisibilityGrantor: Send + Sync {
    /// Allow `identity` to request decryption of `handle`.
    fn grant(&self, handle: CiphertextHandle, identity: Identity);

    /// Allow the vault itself to read `handle`.
    fn grant_self(&self, handle: CiphertextHandle);

    /// Issue a batch of grants in order.
    fn grant_batch(&self, grants: &[VisibilityGrant]) {
        for grant in grants {
            match *grant {
                VisibilityGrant::Vault { handle } => self.grant_self(handle),
                VisibilityGrant::Identity { handle, identity } => self.grant(handle, identity),
            }
        }
    }
}

impl<T: CiphertextVerifier + ?Sized> CiphertextVerifier for Arc<T> {
    fn verify(
        &self,
        payload: &ExternalCiphertext,
        proof: &InputProof,
        context: &VerificationContext,
    ) -> Result<CiphertextHandle, VerifyError> {
        (**self).verify(payload, proof, context)
    }
}

impl<T: VisibilityGrantor + ?Sized> VisibilityGrantor for Arc<T> {
    fn grant(&self, handle: CiphertextHandle, identity: Identity) {
        (**self).grant(handle, identity)
    }

    fn grant_self(&self, handle: CiphertextHandle) {
        (**self).grant_self(handle)
    }

    fn grant_batch(&self, grants: &[VisibilityGrant]) {
        (**self).grant_batch(grants)
    }
}
