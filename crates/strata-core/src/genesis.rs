//! Genesis block construction

use crate::header::INITIAL_BASE_FEE;
use bytes::Bytes;
use strata_forks::ChainConfig;
use strata_primitives::{Address, H256, U256};
use strata_state::WorldState;
use strata_trie::EMPTY_ROOT;
use strata_types::{Block, BlockHeader, Bloom, EMPTY_OMMERS_HASH};

/// Header fields of a genesis block that do not follow from its state
#[derive(Clone, Debug)]
pub struct Genesis {
    /// Block gas limit
    pub gas_limit: u64,
    /// Block difficulty
    pub difficulty: U256,
    /// Block timestamp
    pub timestamp: u64,
    /// Extra data
    pub extra_data: Bytes,
    /// Beneficiary
    pub coinbase: Address,
    /// Proof-of-work mix hash
    pub mix_hash: H256,
    /// Proof-of-work nonce
    pub nonce: [u8; 8],
}

impl Default for Genesis {
    fn default() -> Self {
        Self {
            gas_limit: 8_000_000,
            difficulty: U256::from(0x20000),
            timestamp: 0,
            extra_data: Bytes::new(),
            coinbase: Address::ZERO,
            mix_hash: H256::ZERO,
            nonce: [0u8; 8],
        }
    }
}

impl Genesis {
    /// Genesis header committing to `state`
    pub fn header(&self, config: &ChainConfig, state: &WorldState) -> BlockHeader {
        let rules = config.fork_for(0, self.timestamp);
        BlockHeader {
            parent_hash: H256::ZERO,
            ommers_hash: EMPTY_OMMERS_HASH,
            coinbase: self.coinbase,
            state_root: state.state_root(),
            transactions_root: EMPTY_ROOT,
            receipts_root: EMPTY_ROOT,
            logs_bloom: Bloom::default(),
            difficulty: self.difficulty,
            number: 0,
            gas_limit: self.gas_limit,
            gas_used: 0,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
            base_fee_per_gas: rules.base_fee.then(|| U256::from(INITIAL_BASE_FEE)),
        }
    }

    /// Genesis block committing to `state`
    pub fn block(&self, config: &ChainConfig, state: &WorldState) -> Block {
        Block::new(self.header(config, state), Vec::new(), Vec::new())
    }
}
