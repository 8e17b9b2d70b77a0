//! # strata-crypto
//!
//! Cryptographic primitives used by the state-transition engine.
//!
//! - Keccak-256, SHA-256 and RIPEMD-160 hashing
//! - secp256k1 signing and public key recovery
//! - Address derivation
//! - Precompile arithmetic: modular exponentiation, alt_bn128 and the
//!   BLAKE2b `F` compression function

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blake2;
pub mod bn128;
mod error;
mod hash;
pub mod modexp;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, ripemd160, sha256, KECCAK_EMPTY, KECCAK_NULL_RLP};
pub use signature::{
    public_key_to_address, recover_address, recover_public_key, sign, PrivateKey, PublicKey,
    Signature, SECP256K1_N, SECP256K1_N_DIV_2,
};
