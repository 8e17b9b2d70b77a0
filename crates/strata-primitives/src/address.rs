//! Account address type (20 bytes)

use primitive_types::U256;
use std::fmt;
use thiserror::Error;

use crate::hash::H256;

/// Address parsing error
#[derive(Debug, Error)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 20;

    /// Zero address (0x0000...0000)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        if slice.len() != 20 {
            return Err(AddressError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Parse address from hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Address of the precompile / low address `n` (`0x00..00n`).
    pub const fn from_low_u64(n: u64) -> Self {
        let be = n.to_be_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Address(bytes)
    }

    /// Take the low 160 bits of a stack word.
    pub fn from_word(word: U256) -> Self {
        let mut buf = [0u8; 32];
        word.to_big_endian(&mut buf);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&buf[12..]);
        Address(bytes)
    }

    /// Take the last 20 bytes of a hash (key/contract address derivation).
    pub fn from_hash(hash: &H256) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[12..]);
        Address(bytes)
    }

    /// Zero-extend into a stack word.
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// RLP implementation (behind feature flag)
#[cfg(feature = "rlp")]
mod rlp_impl {
    use super::*;
    use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

    impl Encodable for Address {
        fn rlp_append(&self, s: &mut RlpStream) {
            s.encoder().encode_value(&self.0);
        }
    }

    impl Decodable for Address {
        fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
            rlp.decoder().decode_value(|bytes| {
                Address::from_slice(bytes).map_err(|_| DecoderError::RlpInvalidLength)
            })
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Basic functionality tests ====================

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert!(!addr.is_zero());

        let addr2 = Address::from_hex("742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_hex(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_address_display() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert_eq!(
            format!("{}", addr),
            "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d"
        );
        assert!(format!("{:?}", addr).starts_with("Address(0x742d"));
    }

    // ==================== Length boundary tests ====================

    #[test]
    fn test_address_from_hex_wrong_length() {
        match Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB") {
            Err(AddressError::InvalidLength(19)) => {}
            other => panic!("Expected InvalidLength(19), got {:?}", other),
        }
        match Address::from_hex("0x") {
            Err(AddressError::InvalidLength(0)) => {}
            other => panic!("Expected InvalidLength(0), got {:?}", other),
        }
    }

    #[test]
    fn test_address_from_hex_invalid_chars() {
        assert!(matches!(
            Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aGGG"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    // ==================== Word conversion tests ====================

    #[test]
    fn test_low_u64_address() {
        let ecrecover = Address::from_low_u64(1);
        assert_eq!(ecrecover.as_bytes()[19], 1);
        assert_eq!(ecrecover.as_bytes()[..19], [0u8; 19]);
        assert_eq!(Address::from_low_u64(0x0102).as_bytes()[18..], [0x01, 0x02]);
    }

    #[test]
    fn test_word_roundtrip_truncates_high_bits() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let word = addr.to_word() | (U256::one() << 200);
        assert_eq!(Address::from_word(word), addr);
    }

    #[test]
    fn test_from_hash_takes_last_20_bytes() {
        let mut bytes = [0xaa; 32];
        bytes[12..].copy_from_slice(&[0x11; 20]);
        let addr = Address::from_hash(&H256::from_bytes(bytes));
        assert_eq!(addr.as_bytes(), &[0x11; 20]);
    }

    #[test]
    fn test_address_ordering_is_bytewise() {
        let a = Address::from_low_u64(1);
        let b = Address::from_low_u64(2);
        assert!(a < b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_address_serde_hex() {
        let addr = Address::from_low_u64(0xff);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x00000000000000000000000000000000000000ff\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
