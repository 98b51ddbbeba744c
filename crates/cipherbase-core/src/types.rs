//! Strong type definitions for Cipherbase.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Sequential database identifier.
///
/// Ids are issued starting at 1 and never reused. The value 0 is reserved
/// as the "not found" sentinel and never names a database.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId(pub u64);

impl DatabaseId {
    /// The reserved sentinel id.
    pub const NONE: Self = Self(0);

    /// The first id ever issued.
    pub const FIRST: Self = Self(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Whether this is the reserved sentinel.
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// The id issued after this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatabaseId({})", self.0)
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for DatabaseId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A 20-byte address-like identity.
///
/// Identities are opaque to the ledger; they are compared, stored, and
/// handed to the external encryption subsystem. [`Identity::ZERO`] is the
/// invalid sentinel and can never be granted access.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub [u8; 20]);

impl Identity {
    /// Length of an identity in bytes.
    pub const LEN: usize = 20;

    /// The zero identity (invalid sentinel).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Convert to `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Identity {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: Self::LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

/// A 32-byte opaque ciphertext handle.
///
/// Handles are produced by the external encryption subsystem and are
/// meaningless without it. The all-zero handle denotes an uninitialized
/// value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    /// Length of a handle in bytes.
    pub const LEN: usize = 32;

    /// The uninitialized handle.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the handle refers to an initialized ciphertext.
    pub fn is_initialized(&self) -> bool {
        self.0 != [0u8; 32]
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for CiphertextHandle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for CiphertextHandle {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for CiphertextHandle {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: Self::LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_hex_roundtrip() {
        let id = Identity::from_bytes([0x42; 20]);
        let hex = id.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Identity::from_hex(&hex).unwrap(), id);
        assert_eq!(Identity::from_hex(&hex[2..]).unwrap(), id);
    }

    #[test]
    fn test_identity_rejects_wrong_length() {
        let err = Identity::from_hex("0xabcd").unwrap_err();
        assert_eq!(err, CoreError::InvalidLength { expected: 20, got: 2 });
    }

    #[test]
    fn test_identity_zero() {
        assert!(Identity::ZERO.is_zero());
        assert!(!Identity::from_bytes([1; 20]).is_zero());
    }

    #[test]
    fn test_handle_initialized() {
        assert!(!CiphertextHandle::ZERO.is_initialized());
        assert!(CiphertextHandle::from_bytes([0x01; 32]).is_initialized());
    }

    #[test]
    fn test_handle_display() {
        let handle = CiphertextHandle::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", handle), "abababababababab");
        assert!(format!("{:?}", handle).starts_with("Handle("));
    }

    #[test]
    fn test_database_id_sentinel() {
        assert!(DatabaseId::NONE.is_none());
        assert_eq!(DatabaseId::NONE.next(), DatabaseId::FIRST);
        assert_eq!(format!("{}", DatabaseId::new(7)), "#7");
    }

    proptest! {
        #[test]
        fn identity_hex_parse_ignores_prefix_and_case(bytes in any::<[u8; 20]>()) {
            let id = Identity::from_bytes(bytes);
            let hex = id.to_hex();
            prop_assert_eq!(hex.len(), 42);
            prop_assert_eq!(Identity::from_hex(&hex[2..].to_uppercase()).unwrap(), id);
            prop_assert_eq!(hex.parse::<Identity>().unwrap(), id);
        }
    }
}
