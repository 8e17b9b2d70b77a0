//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// r or s outside `[1, n)`
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid recovery ID
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Recovery failed
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    /// Field element not below the field modulus
    #[error("invalid field element")]
    InvalidFieldElement,

    /// Point is not on the curve or not in the prime-order subgroup
    #[error("invalid curve point")]
    InvalidCurvePoint,

    /// Input has the wrong length for the operation
    #[error("invalid input length: {0}")]
    InvalidInputLength(usize),

    /// BLAKE2 final-block flag was neither 0 nor 1
    #[error("invalid blake2 final block flag: {0}")]
    InvalidFinalFlag(u8),
}
