//! A deterministic stand-in for the external encryption subsystem.
//!
//! [`MockCoprocessor`] plays both collaborator roles a vault needs: it
//! verifies payloads into handles and it records visibility grants. Tests
//! then ask it who can decrypt what.
//!
//! Payloads produced by [`MockCoprocessor::encrypt`] carry the plaintext in
//! the clear (this is a test double) followed by a random nonce. Proofs are a
//! BLAKE3 MAC over the payload and the verification context, so a payload
//! encrypted for one caller or vault is rejected in any other context.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use cipherbase_core::{
    CiphertextHandle, CiphertextVerifier, ExternalCiphertext, Identity, InputProof,
    VerificationContext, VerifyError, VisibilityGrantor,
};
use rand::RngCore;

/// A proof the mock always rejects.
pub const REJECTED_PROOF: &[u8] = b"rejected-proof";

const PAYLOAD_LEN: usize = 8 + 16;
const PROOF_DOMAIN: &str = "cipherbase-testkit 2024 input proof";
const HANDLE_DOMAIN: &str = "cipherbase-testkit 2024 ciphertext handle";

/// In-memory encryption subsystem double.
#[derive(Default)]
pub struct MockCoprocessor {
    state: Mutex<CoprocessorState>,
}

#[derive(Default)]
struct CoprocessorState {
    /// Bumped on every accepted payload so handles never repeat.
    nonce: u64,
    plaintexts: HashMap<CiphertextHandle, u64>,
    readers: HashMap<CiphertextHandle, HashSet<Identity>>,
    vault_readable: HashSet<CiphertextHandle>,
    verifications: usize,
    grants: usize,
}

impl MockCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CoprocessorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encrypt `value` for presentation by `context.caller` to `context.vault`.
    pub fn encrypt(
        &self,
        value: u64,
        context: &VerificationContext,
    ) -> (ExternalCiphertext, InputProof) {
        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.extend_from_slice(&value.to_le_bytes());
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        payload.extend_from_slice(&nonce);

        let proof = prove(&payload, context);
        (ExternalCiphertext::new(payload), InputProof::new(proof.to_vec()))
    }

    /// Whether `identity` was granted visibility over `handle`.
    pub fn can_decrypt(&self, handle: &CiphertextHandle, identity: &Identity) -> bool {
        self.state()
            .readers
            .get(handle)
            .is_some_and(|readers| readers.contains(identity))
    }

    /// Whether the vault itself was granted visibility over `handle`.
    pub fn vault_can_read(&self, handle: &CiphertextHandle) -> bool {
        self.state().vault_readable.contains(handle)
    }

    /// The plaintext behind `handle`, if `identity` may see it.
    pub fn decrypt(&self, handle: &CiphertextHandle, identity: &Identity) -> Option<u64> {
        let state = self.state();
        let allowed = state
            .readers
            .get(handle)
            .is_some_and(|readers| readers.contains(identity));
        if allowed {
            state.plaintexts.get(handle).copied()
        } else {
            None
        }
    }

    /// Identities that may decrypt `handle`.
    pub fn readers_of(&self, handle: &CiphertextHandle) -> HashSet<Identity> {
        self.state()
            .readers
            .get(handle)
            .cloned()
            .unwrap_or_default()
    }

    /// Total verification attempts, accepted or not.
    pub fn verifications(&self) -> usize {
        self.state().verifications
    }

    /// Total grants received, including vault self-grants.
    pub fn grants(&self) -> usize {
        self.state().grants
    }
}

impl CiphertextVerifier for MockCoprocessor {
    fn verify(
        &self,
        payload: &ExternalCiphertext,
        proof: &InputProof,
        context: &VerificationContext,
    ) -> Result<CiphertextHandle, VerifyError> {
        let mut state = self.state();
        state.verifications += 1;

        let bytes = payload.as_bytes();
        if bytes.len() != PAYLOAD_LEN {
            return Err(VerifyError::Malformed(format!(
                "expected {PAYLOAD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if proof.as_bytes() == REJECTED_PROOF {
            return Err(VerifyError::ProofRejected("proof marked invalid".into()));
        }
        if proof.as_bytes() != prove(bytes, context).as_slice() {
            return Err(VerifyError::ContextMismatch);
        }

        let mut value = [0u8; 8];
        value.copy_from_slice(&bytes[..8]);

        state.nonce += 1;
        let mut hasher = blake3::Hasher::new_derive_key(HANDLE_DOMAIN);
        hasher.update(&state.nonce.to_le_bytes());
        hasher.update(bytes);
        hasher.update(context.vault.as_bytes());
        hasher.update(context.caller.as_bytes());
        let handle = CiphertextHandle::from_bytes(*hasher.finalize().as_bytes());

        state.plaintexts.insert(handle, u64::from_le_bytes(value));
        Ok(handle)
    }
}

impl VisibilityGrantor for MockCoprocessor {
    fn grant(&self, handle: CiphertextHandle, identity: Identity) {
        let mut state = self.state();
        state.grants += 1;
        state.readers.entry(handle).or_default().insert(identity);
    }

    fn grant_self(&self, handle: CiphertextHandle) {
        let mut state = self.state();
        state.grants += 1;
        state.vault_readable.insert(handle);
    }
}

fn prove(payload: &[u8], context: &VerificationContext) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(PROOF_DOMAIN);
    hasher.update(context.vault.as_bytes());
    hasher.update(context.caller.as_bytes());
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(caller: u8) -> VerificationContext {
        VerificationContext {
            vault: Identity::from_bytes([0xee; 20]),
            caller: Identity::from_bytes([caller; 20]),
        }
    }

    #[test]
    fn test_encrypt_then_verify() {
        let copro = MockCoprocessor::new();
        let ctx = context(1);
        let (payload, proof) = copro.encrypt(42, &ctx);

        let handle = copro.verify(&payload, &proof, &ctx).unwrap();
        assert!(handle.is_initialized());
        assert_eq!(copro.verifications(), 1);

        // Nothing is visible until granted.
        assert_eq!(copro.decrypt(&handle, &ctx.caller), None);
        copro.grant(handle, ctx.caller);
        assert_eq!(copro.decrypt(&handle, &ctx.caller), Some(42));
    }

    #[test]
    fn test_same_payload_yields_distinct_handles() {
        let copro = MockCoprocessor::new();
        let ctx = context(1);
        let (payload, proof) = copro.encrypt(7, &ctx);

        let a = copro.verify(&payload, &proof, &ctx).unwrap();
        let b = copro.verify(&payload, &proof, &ctx).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejections() {
        let copro = MockCoprocessor::new();
        let ctx = context(1);
        let (payload, proof) = copro.encrypt(7, &ctx);

        let short = ExternalCiphertext::new(vec![1, 2, 3]);
        assert!(matches!(
            copro.verify(&short, &proof, &ctx),
            Err(VerifyError::Malformed(_))
        ));

        let rejected = InputProof::new(REJECTED_PROOF);
        assert!(matches!(
            copro.verify(&payload, &rejected, &ctx),
            Err(VerifyError::ProofRejected(_))
        ));

        assert_eq!(
            copro.verify(&payload, &proof, &context(2)),
            Err(VerifyError::ContextMismatch)
        );
        assert_eq!(copro.verifications(), 3);
    }

    #[test]
    fn test_grant_self_is_separate_from_identity_grants() {
        let copro = MockCoprocessor::new();
        let ctx = context(1);
        let (payload, proof) = copro.encrypt(1, &ctx);
        let handle = copro.verify(&payload, &proof, &ctx).unwrap();

        copro.grant_self(handle);
        assert!(copro.vault_can_read(&handle));
        assert!(!copro.can_decrypt(&handle, &ctx.vault));
        assert!(copro.readers_of(&handle).is_empty());
        assert_eq!(copro.grants(), 1);
    }
}
