//! # strata-primitives
//!
//! Fixed-width primitive types shared by every Strata crate.
//!
//! - [`Address`]: 20-byte account identifier
//! - [`H256`]: 32-byte hash / storage key
//! - [`U256`]: 256-bit machine word (re-exported from `primitive-types`)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Block number type
pub type BlockNumber = u64;

/// Account nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;

/// Decode a `0x`-prefixed (or bare) hex string into bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, PrimitiveError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| PrimitiveError::Hex(e.to_string()))
}

/// Parse a hex quantity (`0x1f`, `0x`, or a decimal string) into a `U256`.
pub fn parse_u256(s: &str) -> Result<U256, PrimitiveError> {
    match s.strip_prefix("0x") {
        Some("") => Ok(U256::zero()),
        Some(digits) => {
            U256::from_str_radix(digits, 16).map_err(|e| PrimitiveError::Quantity(format!("{e:?}")))
        }
        None => U256::from_dec_str(s).map_err(|e| PrimitiveError::Quantity(format!("{e:?}"))),
    }
}

/// Big-endian minimal encoding of a word (no leading zero bytes).
pub fn u256_to_be_trimmed(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let start = buf.iter().position(|&b| b != 0).unwrap_or(32);
    buf[start..].to_vec()
}
