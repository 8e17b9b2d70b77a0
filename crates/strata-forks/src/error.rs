//! Fork configuration errors

use thiserror::Error;

/// Errors from loading a chain configuration
#[derive(Debug, Error)]
pub enum ForkError {
    /// Malformed JSON
    #[error("invalid chain config: {0}")]
    Json(#[from] serde_json::Error),

    /// Fork name not recognised
    #[error("unknown fork: {0}")]
    UnknownFork(String),

    /// A fork activates before its predecessor
    #[error("{later} activates at block {later_block}, before {earlier} at {earlier_block}")]
    OutOfOrder {
        /// Earlier fork in the sequence
        earlier: &'static str,
        /// Its activation block
        earlier_block: u64,
        /// Later fork in the sequence
        later: &'static str,
        /// Its activation block
        later_block: u64,
    },
}
