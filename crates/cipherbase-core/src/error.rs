//! Error types for Cipherbase Core.

use thiserror::Error;

/// Errors produced while constructing or parsing core identifiers.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
