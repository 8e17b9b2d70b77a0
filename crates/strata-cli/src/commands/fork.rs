//! `fork`: rules in force at a block

use std::path::PathBuf;

use clap::Args;
use strata_core::fork_for;
use strata_forks::Fork;

use crate::{config, output::Output, CliError};

/// Show the fork rules for a block number
#[derive(Debug, Args)]
pub struct ForkArgs {
    /// Block number
    pub number: u64,

    /// Block timestamp
    #[arg(long, default_value_t = 0)]
    pub timestamp: u64,

    /// Chain config JSON (defaults to mainnet)
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// Run every block under a single fork instead of a schedule
    #[arg(long, conflicts_with = "chain")]
    pub fork: Option<Fork>,
}

impl ForkArgs {
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let chain = config::load_chain_config(self.chain.as_deref(), self.fork)?;
        let rules = fork_for(&chain, self.number, self.timestamp);
        Output::new(json)
            .field("fork", rules.fork)
            .field_u64("chain_id", chain.chain_id)
            .field("block_reward", rules.block_reward)
            .field_u64("precompiles", u64::from(rules.precompile_count))
            .field_bool("replay_protection", rules.replay_protection)
            .field_bool("state_clearing", rules.state_clearing)
            .field_bool("status_receipts", rules.status_receipts)
            .field_bool("access_lists", rules.access_lists)
            .field_bool("base_fee", rules.base_fee)
            .print();
        Ok(())
    }
}
