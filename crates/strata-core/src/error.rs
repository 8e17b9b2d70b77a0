//! Rejection types for transactions, headers, ommers and blocks

use strata_crypto::CryptoError;
use strata_primitives::{Address, H256, U256};
use strata_state::StateError;
use strata_types::Bloom;
use thiserror::Error;

/// Why a transaction cannot be included in a block.
///
/// Variants follow the order in which checks are made.
#[derive(Debug, Error)]
pub enum TransactionRejection {
    /// Transaction type not active under the current fork
    #[error("transaction type {0} not supported")]
    UnsupportedType(u8),

    /// Signed for another chain, or replay-protected before EIP-155
    #[error("wrong chain id: expected {expected}, got {got:?}")]
    WrongChainId {
        /// Chain id of this chain
        expected: u64,
        /// Chain id in the transaction
        got: Option<u64>,
    },

    /// Signature does not recover a sender
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    /// EIP-2: s above n/2
    #[error("signature s value too high")]
    HighS,

    /// Gas limit below the intrinsic cost
    #[error("intrinsic gas too low: need {intrinsic}, limit {gas_limit}")]
    IntrinsicGas {
        /// Intrinsic cost
        intrinsic: u64,
        /// Transaction gas limit
        gas_limit: u64,
    },

    /// Gas limit above what is left in the block
    #[error("block gas exceeded: need {gas_limit}, available {available}")]
    BlockGasExceeded {
        /// Transaction gas limit
        gas_limit: u64,
        /// Gas remaining in the block
        available: u64,
    },

    /// EIP-1559: tip cap above fee cap
    #[error("max priority fee {priority} above max fee {max_fee}")]
    PriorityFeeAboveMax {
        /// Max priority fee per gas
        priority: U256,
        /// Max fee per gas
        max_fee: U256,
    },

    /// EIP-1559: fee cap below the block base fee
    #[error("max fee {max_fee} below base fee {base_fee}")]
    FeeBelowBaseFee {
        /// Max fee per gas, or gas price
        max_fee: U256,
        /// Block base fee
        base_fee: U256,
    },

    /// Nonce differs from the sender's
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch {
        /// Sender account nonce
        expected: u64,
        /// Transaction nonce
        got: u64,
    },

    /// EIP-2681: nonce at 2^64-1
    #[error("nonce at maximum")]
    NonceMax,

    /// Balance does not cover gas and value
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// gas * max price + value
        required: U256,
        /// Sender balance
        available: U256,
    },

    /// EIP-3607: sender is a contract
    #[error("sender {0} has code")]
    SenderHasCode(Address),

    /// World-state invariant broken while executing
    #[error(transparent)]
    Internal(#[from] StateError),
}

/// Header fields inconsistent with the parent header
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Parent hash is not the parent's hash
    #[error("parent hash mismatch: expected {expected}, got {got}")]
    ParentHash {
        /// Hash of the parent header
        expected: H256,
        /// Header parent hash
        got: H256,
    },

    /// Number is not parent + 1
    #[error("block number mismatch: expected {expected}, got {got}")]
    Number {
        /// Parent number + 1
        expected: u64,
        /// Header number
        got: u64,
    },

    /// Gas used above the gas limit
    #[error("gas used {used} above gas limit {limit}")]
    GasUsed {
        /// Header gas used
        used: u64,
        /// Header gas limit
        limit: u64,
    },

    /// Gas limit moved too far from the parent's, or is below the minimum
    #[error("gas limit {limit} invalid for parent limit {parent}")]
    GasLimit {
        /// Header gas limit
        limit: u64,
        /// Parent gas limit, after elasticity adjustment
        parent: u64,
    },

    /// Timestamp not after the parent's
    #[error("timestamp {timestamp} not after parent {parent}")]
    Timestamp {
        /// Header timestamp
        timestamp: u64,
        /// Parent timestamp
        parent: u64,
    },

    /// Extra data longer than 32 bytes
    #[error("extra data too long: {0} bytes")]
    ExtraData(usize),

    /// Difficulty does not follow the adjustment formula
    #[error("difficulty mismatch: expected {expected}, got {got}")]
    Difficulty {
        /// Computed difficulty
        expected: U256,
        /// Header difficulty
        got: U256,
    },

    /// Base fee missing, unexpected, or off the EIP-1559 formula
    #[error("base fee mismatch: expected {expected:?}, got {got:?}")]
    BaseFee {
        /// Computed base fee
        expected: Option<U256>,
        /// Header base fee
        got: Option<U256>,
    },
}

/// Invalid ommer list
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OmmerError {
    /// Ommers hash is not keccak of the ommer list
    #[error("ommers hash mismatch: expected {expected}, got {got}")]
    Hash {
        /// Hash of the ommer list
        expected: H256,
        /// Header ommers hash
        got: H256,
    },

    /// More than two ommers
    #[error("too many ommers: {0}")]
    TooMany(usize),

    /// Same ommer twice in one block
    #[error("duplicate ommer {0}")]
    Duplicate(H256),

    /// Ommer number outside 1..=6 generations back
    #[error("ommer {hash} has invalid age {age}")]
    Age {
        /// Ommer hash
        hash: H256,
        /// Nephew number minus ommer number
        age: u64,
    },

    /// Ommer header invalid against its parent
    #[error("ommer {hash} has invalid header: {source}")]
    Header {
        /// Ommer hash
        hash: H256,
        /// What is wrong
        source: HeaderError,
    },

    /// Ommer is one of the recent canonical blocks, or the block itself
    #[error("ommer {0} is a canonical block")]
    Canonical(H256),

    /// Ommer already included by a recent block
    #[error("ommer {0} already included")]
    AlreadyIncluded(H256),

    /// Ommer's parent is not a recent canonical block
    #[error("ommer {0} has unknown parent")]
    UnknownParent(H256),

    /// Ommer is a sibling of the block
    #[error("ommer {0} shares the block's parent")]
    Sibling(H256),
}

/// Why a block was rejected. The chain it was applied to is unchanged.
#[derive(Debug, Error)]
pub enum BlockRejection {
    /// Header invalid against the parent
    #[error("invalid header: {0}")]
    Header(#[from] HeaderError),

    /// Invalid ommers
    #[error("invalid ommers: {0}")]
    Ommer(#[from] OmmerError),

    /// A transaction could not be included
    #[error("invalid transaction {index}: {source}")]
    Transaction {
        /// Position in the block
        index: usize,
        /// What is wrong
        source: TransactionRejection,
    },

    /// Header gas used differs from execution
    #[error("gas used mismatch: header {header}, computed {computed}")]
    GasUsed {
        /// Header value
        header: u64,
        /// Gas used by execution
        computed: u64,
    },

    /// Transactions root differs
    #[error("transactions root mismatch: header {header}, computed {computed}")]
    TransactionsRoot {
        /// Header value
        header: H256,
        /// Root of the block's transactions
        computed: H256,
    },

    /// Receipts root differs
    #[error("receipts root mismatch: header {header}, computed {computed}")]
    ReceiptsRoot {
        /// Header value
        header: H256,
        /// Root of the computed receipts
        computed: H256,
    },

    /// Logs bloom differs
    #[error("logs bloom mismatch: header {header:?}, computed {computed:?}")]
    LogsBloom {
        /// Header value
        header: Bloom,
        /// Bloom of the computed receipts
        computed: Bloom,
    },

    /// State root differs
    #[error("state root mismatch: header {header}, computed {computed}")]
    StateRoot {
        /// Header value
        header: H256,
        /// Root after execution and rewards
        computed: H256,
    },
}

/// Failure to import a block
#[derive(Debug, Error)]
pub enum BlockError {
    /// The block is invalid and the parent chain is unchanged
    #[error(transparent)]
    Rejected(#[from] BlockRejection),

    /// World-state invariant broken; the engine is at fault, not the block
    #[error("internal error: {0}")]
    Internal(#[from] StateError),
}

impl BlockError {
    /// Attach a transaction index, lifting internal errors out unchanged
    pub fn transaction(index: usize, rejection: TransactionRejection) -> Self {
        match rejection {
            TransactionRejection::Internal(error) => BlockError::Internal(error),
            source => BlockError::Rejected(BlockRejection::Transaction { index, source }),
        }
    }

    /// The rejection, unless this is an internal fault
    pub fn rejection(&self) -> Option<&BlockRejection> {
        match self {
            BlockError::Rejected(rejection) => Some(rejection),
            BlockError::Internal(_) => None,
        }
    }
}

impl From<HeaderError> for BlockError {
    fn from(error: HeaderError) -> Self {
        BlockError::Rejected(error.into())
    }
}

impl From<OmmerError> for BlockError {
    fn from(error: OmmerError) -> Self {
        BlockError::Rejected(error.into())
    }
}

/// Result type for block processing
pub type BlockResult<T> = Result<T, BlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_rejection_keeps_index() {
        let error = BlockError::transaction(3, TransactionRejection::NonceMax);
        assert!(matches!(
            error.rejection(),
            Some(BlockRejection::Transaction {
                index: 3,
                source: TransactionRejection::NonceMax
            })
        ));
        assert_eq!(error.to_string(), "invalid transaction 3: nonce at maximum");
    }

    #[test]
    fn test_internal_fault_is_not_a_rejection() {
        let fault = StateError::BalanceOverflow(Address::from_low_u64(1));
        let error = BlockError::transaction(0, TransactionRejection::Internal(fault));
        assert!(matches!(error, BlockError::Internal(StateError::BalanceOverflow(_))));
        assert!(error.rejection().is_none());

        let error = BlockError::from(HeaderError::ExtraData(33));
        assert!(matches!(
            error,
            BlockError::Rejected(BlockRejection::Header(HeaderError::ExtraData(33)))
        ));
    }
}
