//! `apply`: run blocks on top of a genesis allocation

use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use strata_core::{compute_state_root, BlockChain, Genesis};
use strata_forks::Fork;
use tracing::info;

use crate::{config, output::Output, CliError};

/// Apply RLP blocks to a genesis allocation
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Genesis allocation JSON
    #[arg(long)]
    pub alloc: PathBuf,

    /// File of hex-encoded RLP blocks, one per line
    #[arg(long)]
    pub blocks: PathBuf,

    /// Chain config JSON (defaults to mainnet)
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// Run every block under a single fork instead of a schedule
    #[arg(long, conflicts_with = "chain")]
    pub fork: Option<Fork>,

    /// Write the final state as allocation JSON
    #[arg(long)]
    pub dump_state: Option<PathBuf>,
}

impl ApplyArgs {
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let chain_config = config::load_chain_config(self.chain.as_deref(), self.fork)?;
        let state = config::load_alloc(&self.alloc)?;
        let mut blocks = config::load_blocks(&self.blocks)?.into_iter().peekable();

        // A leading block 0 is the genesis block and must commit to the alloc.
        let mut chain = match blocks.next_if(|block| block.number() == 0) {
            Some(genesis) => BlockChain::new(chain_config, genesis, state)
                .map_err(|source| CliError::Rejected { number: 0, source })?,
            None => BlockChain::from_genesis(chain_config, &Genesis::default(), state),
        };
        info!("Genesis {} state_root={}", chain.head().hash(), chain.state().state_root());

        let mut applied = Vec::new();
        for block in blocks {
            let number = block.number();
            chain
                .append_block(&block)
                .map_err(|error| CliError::block(number, error))?;
            info!("Block {} applied: {} transactions", number, block.tx_count());
            applied.push(json!({
                "number": number,
                "hash": block.hash().to_string(),
                "transactions": block.tx_count(),
                "gas_used": block.header.gas_used,
            }));
        }

        if let Some(path) = &self.dump_state {
            config::write_file(path, &chain.state().to_json()?)?;
        }

        let head = chain.head();
        Output::new(json)
            .message(&format!("Applied {} blocks", applied.len()))
            .field_u64("head_number", head.number())
            .field("head_hash", head.hash())
            .field("state_root", compute_state_root(chain.state()))
            .field_value("blocks", serde_json::Value::Array(applied))
            .print();
        Ok(())
    }
}
