//! EVM error types

use strata_state::StateError;
use thiserror::Error;

/// Conditions that abort a frame and consume all of its gas
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExceptionalHalt {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Undefined opcode, or one not yet active
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Jump target is not a JUMPDEST
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// State modification inside STATICCALL
    #[error("state modification in static context")]
    WriteInStaticContext,

    /// RETURNDATACOPY beyond the return buffer
    #[error("return data out of bounds")]
    OutOfBounds,

    /// Contract creation onto an account with code or nonce
    #[error("contract address collision")]
    AddressCollision,

    /// EIP-3541: deployed code starting with 0xEF
    #[error("contract code starts with 0xef")]
    InvalidContractPrefix,

    /// Precompile rejected its input
    #[error("precompile error: {0}")]
    Precompile(String),
}

/// Why a frame stopped without success, as recorded on the frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Exceptional halt: all gas consumed, output discarded
    #[error(transparent)]
    Halt(#[from] ExceptionalHalt),

    /// REVERT: remaining gas and output returned to the caller
    #[error("execution reverted")]
    Revert,
}

/// Error raised inside an opcode handler
#[derive(Debug, Error)]
pub enum VmError {
    /// Frame halts exceptionally
    #[error(transparent)]
    Halt(#[from] ExceptionalHalt),

    /// Frame reverts
    #[error("execution reverted")]
    Revert,

    /// World-state invariant broken; aborts the whole transaction
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result type for opcode handlers
pub type VmResult<T> = Result<T, VmError>;
