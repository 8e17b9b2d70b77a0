//! `state-root`: root of a genesis allocation

use std::path::PathBuf;

use clap::Args;
use strata_core::compute_state_root;

use crate::{config, output::Output, CliError};

/// Compute the state root of an allocation
#[derive(Debug, Args)]
pub struct StateRootArgs {
    /// Genesis allocation JSON
    #[arg(long)]
    pub alloc: PathBuf,
}

impl StateRootArgs {
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let state = config::load_alloc(&self.alloc)?;
        let root = compute_state_root(&state);
        Output::new(json)
            .field("state_root", root)
            .field_u64("accounts", state.accounts().count() as u64)
            .print();
        Ok(())
    }
}
