//! Execution context for EVM

use bytes::Bytes;
use std::collections::{BTreeSet, HashSet};
use strata_primitives::{Address, H256, U256};

/// Block environment information
#[derive(Clone, Debug)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block coinbase (beneficiary)
    pub coinbase: Address,
    /// Block difficulty
    pub difficulty: U256,
    /// Chain ID
    pub chain_id: u64,
    /// Base fee (EIP-1559); `None` before London
    pub base_fee: Option<U256>,
    /// Hashes of up to 256 preceding blocks, oldest first
    pub block_hashes: Vec<H256>,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            coinbase: Address::ZERO,
            difficulty: U256::zero(),
            chain_id: 1,
            base_fee: None,
            block_hashes: Vec::new(),
        }
    }
}

impl BlockContext {
    /// BLOCKHASH: hash of one of the 256 most recent blocks, zero otherwise
    pub fn block_hash(&self, number: U256) -> H256 {
        let current = U256::from(self.number);
        if number >= current || current - number > U256::from(256) {
            return H256::ZERO;
        }
        let back = (current - number).low_u64() as usize;
        self.block_hashes
            .len()
            .checked_sub(back)
            .and_then(|index| self.block_hashes.get(index))
            .copied()
            .unwrap_or(H256::ZERO)
    }
}

/// Transaction environment information
#[derive(Clone, Debug, Default)]
pub struct TxContext {
    /// Transaction origin (original sender)
    pub origin: Address,
    /// Effective gas price
    pub gas_price: U256,
}

/// Complete execution environment
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Block context
    pub block: BlockContext,
    /// Transaction context
    pub tx: TxContext,
}

impl Environment {
    /// Create new environment
    pub fn new(block: BlockContext, tx: TxContext) -> Self {
        Self { block, tx }
    }
}

/// One message call or contract creation
#[derive(Clone, Debug, Default)]
pub struct Message {
    /// Account that sent the message
    pub caller: Address,
    /// Whether this message deploys a contract
    pub is_create: bool,
    /// Account whose storage and balance the code acts on
    pub current_target: Address,
    /// Account whose code runs; `None` for creations
    pub code_address: Option<Address>,
    /// Gas made available to the frame
    pub gas: u64,
    /// Value transferred (or reported by CALLVALUE for DELEGATECALL)
    pub value: U256,
    /// Call data; empty for creations
    pub data: Bytes,
    /// Code to run: callee code, or init code for creations
    pub code: Bytes,
    /// Call depth, 0 for the transaction's own message
    pub depth: usize,
    /// Whether `value` moves from caller to target
    pub should_transfer_value: bool,
    /// STATICCALL context
    pub is_static: bool,
    /// EIP-2929 warm addresses
    pub accessed_addresses: HashSet<Address>,
    /// EIP-2929 warm storage slots
    pub accessed_storage_keys: HashSet<(Address, H256)>,
    /// Accounts already scheduled for deletion by enclosing frames
    pub accounts_to_delete: BTreeSet<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_at(number: u64, known: u64) -> BlockContext {
        BlockContext {
            number,
            block_hashes: (number - known..number)
                .map(|n| H256::from_word(U256::from(n + 1000)))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_block_context_default() {
        let ctx = BlockContext::default();
        assert_eq!(ctx.number, 0);
        assert_eq!(ctx.gas_limit, 30_000_000);
        assert_eq!(ctx.coinbase, Address::ZERO);
        assert_eq!(ctx.chain_id, 1);
        assert_eq!(ctx.base_fee, None);
    }

    #[test]
    fn test_block_hash_window() {
        let ctx = block_at(300, 256);
        assert_eq!(ctx.block_hash(U256::from(299)), H256::from_word(U256::from(1299)));
        assert_eq!(ctx.block_hash(U256::from(44)), H256::from_word(U256::from(1044)));
        assert_eq!(ctx.block_hash(U256::from(43)), H256::ZERO);
        assert_eq!(ctx.block_hash(U256::from(300)), H256::ZERO);
        assert_eq!(ctx.block_hash(U256::MAX), H256::ZERO);
    }

    #[test]
    fn test_block_hash_short_history() {
        let ctx = block_at(3, 3);
        assert_eq!(ctx.block_hash(U256::zero()), H256::from_word(U256::from(1000)));
        assert_eq!(ctx.block_hash(U256::from(2)), H256::from_word(U256::from(1002)));
    }

    #[test]
    fn test_message_default() {
        let msg = Message::default();
        assert!(!msg.is_create);
        assert_eq!(msg.depth, 0);
        assert!(msg.accessed_addresses.is_empty());
    }
}
