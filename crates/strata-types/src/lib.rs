//! # strata-types
//!
//! Consensus data structures and their canonical RLP forms.
//!
//! This crate provides:
//! - [`BlockHeader`](block::BlockHeader) and [`Block`](block::Block)
//! - [`SignedTransaction`](transaction::SignedTransaction): legacy, EIP-2930 and EIP-1559
//! - [`Receipt`](receipt::Receipt), [`Log`](receipt::Log) and the logs [`Bloom`](block::Bloom)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod receipt;
pub mod transaction;

// Re-export commonly used types
pub use block::{compute_ommers_hash, Block, BlockHeader, Bloom, EMPTY_OMMERS_HASH};
pub use receipt::{logs_bloom, Log, Receipt, ReceiptOutcome, TxStatus};
pub use transaction::{
    AccessListItem, AccessListTx, DynamicFeeTx, LegacyTx, SignedTransaction, TransactionBody,
    TxSignature, TxType,
};
