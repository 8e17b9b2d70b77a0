//! CLI error types

use std::path::PathBuf;
use strata_core::BlockError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid hex string
    #[error("Invalid hex on line {line}: {reason}")]
    InvalidHex {
        /// 1-based line of the blocks file
        line: usize,
        /// Decoder message
        reason: String,
    },

    /// A blocks file line is not an RLP block
    #[error("Invalid block on line {line}: {source}")]
    InvalidBlock {
        /// 1-based line of the blocks file
        line: usize,
        /// Decoder error
        source: strata_rlp::RlpError,
    },

    /// Allocation could not be loaded or exported
    #[error("State error: {0}")]
    State(#[from] strata_state::StateError),

    /// Chain config could not be loaded
    #[error("Invalid chain config: {0}")]
    ChainConfig(#[from] strata_forks::ForkError),

    /// A block was rejected
    #[error("Block {number} rejected: {source}")]
    Rejected {
        /// Number of the rejected block
        number: u64,
        /// Rejection reason
        source: strata_core::BlockRejection,
    },

    /// Engine fault while applying a block
    #[error("Internal error at block {number}: {source}")]
    Internal {
        /// Number of the block being applied
        number: u64,
        /// Broken state invariant
        source: strata_state::StateError,
    },

    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Failure to apply block `number`
    pub fn block(number: u64, error: BlockError) -> Self {
        match error {
            BlockError::Rejected(source) => CliError::Rejected { number, source },
            BlockError::Internal(source) => CliError::Internal { number, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::BlockRejection;
    use strata_primitives::{Address, H256};
    use strata_state::StateError;

    #[test]
    fn test_block_error_keeps_rejections_and_faults_apart() {
        let rejected = CliError::block(
            4,
            BlockError::Rejected(BlockRejection::StateRoot {
                header: H256::ZERO,
                computed: H256::ZERO,
            }),
        );
        assert!(matches!(rejected, CliError::Rejected { number: 4, .. }));
        assert!(rejected.to_string().starts_with("Block 4 rejected"));

        let fault = StateError::BalanceOverflow(Address::from_low_u64(1));
        let internal = CliError::block(5, BlockError::Internal(fault));
        assert!(matches!(internal, CliError::Internal { number: 5, .. }));
        assert!(internal.to_string().starts_with("Internal error at block 5"));
    }
}
