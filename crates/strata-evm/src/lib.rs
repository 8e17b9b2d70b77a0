//! # strata-evm
//!
//! Ethereum Virtual Machine for the Strata state-transition engine.
//!
//! This crate provides:
//! - The bytecode interpreter and its gas accounting
//! - Message calls and contract creation over [`strata_state::WorldState`]
//! - The precompiled contracts
//!
//! Behaviour that differs between forks is read from a
//! [`strata_forks::ForkRules`] value handed to [`Evm::new`]. Exceptional
//! halts and reverts are values recorded on the [`Frame`]; only broken
//! world-state invariants surface as `Err`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod frame;
pub mod gas;
mod instructions;
pub mod interpreter;
pub mod memory;
pub mod opcode;
pub mod precompiles;
pub mod stack;
mod system;

pub use context::{BlockContext, Environment, Message, TxContext};
pub use error::{ExceptionalHalt, FrameError, VmError, VmResult};
pub use frame::{Frame, MessageCallOutput};
pub use interpreter::Evm;
pub use opcode::Opcode;
pub use system::{compute_contract_address, compute_create2_address};
