//! Genesis-style allocation snapshots
//!
//! The JSON shape is the `alloc` object of a geth genesis file and of the
//! `pre`/`postState` sections of consensus test fixtures:
//!
//! ```json
//! { "0xa94f…0b": { "balance": "0x0de0b6b3a7640000", "nonce": "0x01",
//!                  "code": "0x", "storage": { "0x00": "0x01" } } }
//! ```

use crate::error::StateResult;
use crate::state::WorldState;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use strata_primitives::{u256_to_be_trimmed, Address, H256, U256};

/// Hex-encoded byte string; `0x` and `""` are empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        if s.is_empty() {
            return Ok(HexBytes(Vec::new()));
        }
        hex::decode(s)
            .map(HexBytes)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

/// Hex quantity up to 256 bits; odd digit counts are accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HexU256(pub U256);

impl<'de> Deserialize<'de> for HexU256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        if s.is_empty() {
            return Ok(HexU256(U256::zero()));
        }
        if s.len() > 64 {
            return Err(serde::de::Error::custom(format!(
                "quantity too large: {} hex digits",
                s.len()
            )));
        }
        U256::from_str_radix(s, 16)
            .map(HexU256)
            .map_err(|e| serde::de::Error::custom(format!("{e:?}")))
    }
}

impl Serialize for HexU256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let digits = hex::encode(u256_to_be_trimmed(self.0));
        if digits.is_empty() {
            serializer.serialize_str("0x00")
        } else {
            serializer.serialize_str(&format!("0x{digits}"))
        }
    }
}

/// Hex `u64` quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexU64(pub u64);

impl<'de> Deserialize<'de> for HexU64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        if s.is_empty() {
            return Ok(HexU64(0));
        }
        u64::from_str_radix(s, 16)
            .map(HexU64)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for HexU64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{:x}", self.0))
    }
}

/// One account of an allocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocAccount {
    #[serde(default)]
    pub balance: HexU256,
    #[serde(default)]
    pub nonce: HexU64,
    #[serde(default)]
    pub code: HexBytes,
    #[serde(default)]
    pub storage: BTreeMap<HexU256, HexU256>,
}

/// Address-keyed allocation
pub type Alloc = BTreeMap<Address, AllocAccount>;

impl WorldState {
    /// Build a state from an allocation. Zero storage values are skipped.
    pub fn from_alloc(alloc: &Alloc) -> Self {
        let mut state = WorldState::new();
        for (address, account) in alloc {
            state.set_balance(address, account.balance.0);
            state.set_nonce(address, account.nonce.0);
            if !account.code.0.is_empty() {
                state.set_code(address, Bytes::from(account.code.0.clone()));
            }
            for (key, value) in &account.storage {
                state.set_storage(*address, H256::from_word(key.0), value.0);
            }
        }
        state.begin_transaction();
        state
    }

    /// Export every account as an allocation
    pub fn to_alloc(&self) -> Alloc {
        self.accounts()
            .map(|(address, account)| {
                let entry = AllocAccount {
                    balance: HexU256(account.balance),
                    nonce: HexU64(account.nonce),
                    code: HexBytes(self.code(address).to_vec()),
                    storage: self
                        .storage_of(address)
                        .map(|(key, value)| (HexU256(key.to_word()), HexU256(*value)))
                        .collect(),
                };
                (*address, entry)
            })
            .collect()
    }

    /// Parse an allocation JSON document
    pub fn from_json(json: &str) -> StateResult<Self> {
        let alloc: Alloc = serde_json::from_str(json)?;
        Ok(Self::from_alloc(&alloc))
    }

    /// Render the state as allocation JSON
    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_alloc())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;

    const SENDER: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";

    // ==================== Hex parsing ====================

    #[test]
    fn test_hex_quantities() {
        let v: HexU256 = serde_json::from_str(r#""0x0de0b6b3a7640000""#).unwrap();
        assert_eq!(v.0, U256::from(1_000_000_000_000_000_000u64));
        let odd: HexU256 = serde_json::from_str(r#""0x100""#).unwrap();
        assert_eq!(odd.0, U256::from(256));
        let empty: HexU64 = serde_json::from_str(r#""0x""#).unwrap();
        assert_eq!(empty.0, 0);
        assert!(serde_json::from_str::<HexU256>(&format!("\"0x1{}\"", "0".repeat(64))).is_err());
    }

    #[test]
    fn test_hex_bytes() {
        let code: HexBytes = serde_json::from_str(r#""0x6001""#).unwrap();
        assert_eq!(code.0, vec![0x60, 0x01]);
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""0x6001""#);
        assert!(serde_json::from_str::<HexBytes>(r#""0xzz""#).is_err());
    }

    // ==================== Alloc loading ====================

    #[test]
    fn test_from_json() {
        let json = format!(
            r#"{{
                "{SENDER}": {{ "balance": "0x0de0b6b3a7640000", "nonce": "0x01" }},
                "0x1000000000000000000000000000000000000000": {{
                    "code": "0x600160005500",
                    "storage": {{ "0x00": "0x01", "0x01": "0x00" }}
                }}
            }}"#
        );
        let state = WorldState::from_json(&json).unwrap();
        let sender = Address::from_hex(SENDER).unwrap();
        let contract = Address::from_hex("0x1000000000000000000000000000000000000000").unwrap();

        assert_eq!(state.account(&sender).unwrap().nonce, 1);
        assert_eq!(state.code(&contract).len(), 6);
        assert_eq!(state.storage(&contract, &H256::from_word(U256::zero())), U256::one());
        assert_eq!(state.storage_of(&contract).count(), 1);
    }

    #[test]
    fn test_alloc_survives_export() {
        let json = format!(
            r#"{{ "{SENDER}": {{ "balance": "0x64", "code": "0x00", "storage": {{ "0x02": "0x2a" }} }} }}"#
        );
        let state = WorldState::from_json(&json).unwrap();
        let reloaded = WorldState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.state_root(), state.state_root());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            WorldState::from_json(r#"{"0x12": {}}"#),
            Err(StateError::Snapshot(_))
        ));
    }
}
