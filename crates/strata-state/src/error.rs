//! State error types

use strata_primitives::{Address, U256};
use thiserror::Error;

/// World-state errors. Reaching one during block processing means an
/// invariant was broken upstream.
#[derive(Debug, Error)]
pub enum StateError {
    /// Nonce would exceed `u64::MAX`
    #[error("nonce overflow for {0}")]
    NonceOverflow(Address),

    /// Debit larger than the balance
    #[error("insufficient balance for {address}: need {needed}, have {available}")]
    InsufficientBalance {
        /// Debited account
        address: Address,
        /// Requested amount
        needed: U256,
        /// Current balance
        available: U256,
    },

    /// Credit would overflow 256 bits
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    /// Revert or commit without an open checkpoint
    #[error("no open checkpoint")]
    NoCheckpoint,

    /// Malformed snapshot JSON
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
