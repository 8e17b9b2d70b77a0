//! Canonical chain: recent blocks and the state after the head

use crate::error::{BlockRejection, BlockResult};
use crate::executor::{check_execution_result, BlockExecutor};
use crate::genesis::Genesis;
use crate::header::validate_header;
use crate::ommers::validate_ommers;
use crate::transaction::BlockEnv;
use strata_evm::BlockContext;
use strata_forks::ChainConfig;
use strata_primitives::H256;
use strata_state::WorldState;
use strata_types::{Block, BlockHeader};
use tracing::{debug, warn};

/// Blocks kept for BLOCKHASH and ommer checks
pub const RECENT_BLOCKS: usize = 255;

/// The recent canonical blocks and the world state after the newest one
#[derive(Clone, Debug)]
pub struct BlockChain {
    config: ChainConfig,
    blocks: Vec<Block>,
    state: WorldState,
}

impl BlockChain {
    /// Start a chain from `genesis`, whose header must commit to `state`
    pub fn new(config: ChainConfig, genesis: Block, state: WorldState) -> Result<Self, BlockRejection> {
        let computed = state.state_root();
        if genesis.header.state_root != computed {
            return Err(BlockRejection::StateRoot {
                header: genesis.header.state_root,
                computed,
            });
        }
        Ok(Self {
            config,
            blocks: vec![genesis],
            state,
        })
    }

    /// Start a chain from a genesis block built over `state`
    pub fn from_genesis(config: ChainConfig, genesis: &Genesis, state: WorldState) -> Self {
        let block = genesis.block(&config, &state);
        Self {
            config,
            blocks: vec![block],
            state,
        }
    }

    /// Fork schedule
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Newest block
    pub fn head(&self) -> &Block {
        // The chain is never empty: it starts with a genesis block and only grows.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Recent blocks, oldest first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// State after the head block
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Take the state
    pub fn into_state(self) -> WorldState {
        self.state
    }

    /// Hashes visible to BLOCKHASH in a child of the head, oldest first
    pub fn block_hashes(&self) -> Vec<H256> {
        let mut hashes: Vec<H256> = self
            .blocks
            .iter()
            .map(|block| block.header.parent_hash)
            .collect();
        hashes.push(self.head().hash());
        hashes
    }

    /// Execution environment of `header` on top of this chain
    pub fn block_env(&self, header: &BlockHeader) -> BlockEnv {
        BlockEnv {
            rules: self.config.fork_for(header.number, header.timestamp),
            block: BlockContext {
                number: header.number,
                timestamp: header.timestamp,
                gas_limit: header.gas_limit,
                coinbase: header.coinbase,
                difficulty: header.difficulty,
                chain_id: self.config.chain_id,
                base_fee: header.base_fee_per_gas,
                block_hashes: self.block_hashes(),
            },
        }
    }

    /// Apply `block` in place. On rejection the chain is unchanged.
    pub fn append_block(&mut self, block: &Block) -> BlockResult<()> {
        *self = apply_block(self, block)?;
        Ok(())
    }
}

/// Validate and execute `block` on top of `parent`, returning the extended chain
pub fn apply_block(parent: &BlockChain, block: &Block) -> BlockResult<BlockChain> {
    match try_apply_block(parent, block) {
        Ok(chain) => {
            debug!(
                "Applied block {} ({}): {} transactions, {} ommers",
                block.number(),
                block.hash(),
                block.tx_count(),
                block.ommers.len()
            );
            Ok(chain)
        }
        Err(error) => {
            warn!("Rejected block {} ({}): {}", block.number(), block.hash(), error);
            Err(error)
        }
    }
}

fn try_apply_block(parent: &BlockChain, block: &Block) -> BlockResult<BlockChain> {
    let header = &block.header;
    validate_header(&parent.config, header, &parent.head().header)?;
    validate_ommers(&parent.config, &parent.blocks, header, &block.ommers)?;

    let mut state = parent.state.clone();
    let result = BlockExecutor::new(parent.block_env(header), &mut state).execute_block(block)?;
    check_execution_result(block, &result)?;

    let mut blocks = parent.blocks.clone();
    blocks.push(block.clone());
    if blocks.len() > RECENT_BLOCKS {
        blocks.drain(..blocks.len() - RECENT_BLOCKS);
    }
    Ok(BlockChain {
        config: parent.config.clone(),
        blocks,
        state,
    })
}
