//! Account records

use strata_crypto::KECCAK_EMPTY;
use strata_primitives::{H256, U256};
use strata_rlp::{Encodable, RlpStream};

/// Empty code hash (keccak256 of empty bytes)
pub const EMPTY_CODE_HASH: H256 = KECCAK_EMPTY;

/// Empty storage root (keccak256 of RLP encoded empty string)
pub const EMPTY_STORAGE_ROOT: H256 = strata_trie::EMPTY_ROOT;

/// Account data held in the world state. Storage lives beside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account nonce
    pub nonce: u64,
    /// Account balance
    pub balance: U256,
    /// Code hash (keccak256 of code, or EMPTY_CODE_HASH if no code)
    pub code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            code_hash: EMPTY_CODE_HASH,
        }
    }

    /// Check if account is empty (EIP-161)
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_CODE_HASH
    }

    /// Check if account has code
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    /// Trie leaf for this account given its storage root
    pub fn to_trie_account(&self, storage_root: H256) -> TrieAccount {
        TrieAccount {
            nonce: self.nonce,
            balance: self.balance,
            storage_root,
            code_hash: self.code_hash,
        }
    }
}

/// Account as committed in the state trie
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrieAccount {
    /// Account nonce
    pub nonce: u64,
    /// Account balance
    pub balance: U256,
    /// Root of the account's storage trie
    pub storage_root: H256,
    /// Code hash
    pub code_hash: H256,
}

impl Encodable for TrieAccount {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&self.storage_root);
        s.append(&self.code_hash);
    }
}
