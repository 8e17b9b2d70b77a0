//! # strata-core
//!
//! Transaction and block processing for Strata.
//!
//! This crate ties the components together:
//! - Transaction validation, execution and fee settlement
//! - Header, difficulty and base fee validation
//! - Ommer validation and block rewards
//! - The [`BlockChain`] value that blocks are applied to
//!
//! [`apply_block`] never mutates its input: a rejected block leaves the
//! parent chain exactly as it was.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod error;
pub mod executor;
pub mod genesis;
pub mod header;
pub mod ommers;
pub mod transaction;

pub use chain::{apply_block, BlockChain, RECENT_BLOCKS};
pub use error::{
    BlockError, BlockRejection, BlockResult, HeaderError, OmmerError, TransactionRejection,
};
pub use executor::{BlockExecutionResult, BlockExecutor};
pub use genesis::Genesis;
pub use transaction::{process_transaction, BlockEnv, TransactionOutcome};

use strata_forks::{ChainConfig, ForkRules};
use strata_primitives::H256;
use strata_state::WorldState;

/// Root of the state trie of `state`
pub fn compute_state_root(state: &WorldState) -> H256 {
    state.state_root()
}

/// Rules in force for the block at `number` and `timestamp`
pub fn fork_for(config: &ChainConfig, number: u64, timestamp: u64) -> ForkRules {
    config.fork_for(number, timestamp)
}
