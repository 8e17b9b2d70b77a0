//! # strata-trie
//!
//! In-memory Merkle-Patricia Trie producing the canonical Ethereum root
//! commitment.
//!
//! - [`Trie`]: raw keys, used for transaction and receipt lists
//! - [`SecureTrie`]: keccak-hashed keys, used for accounts and storage
//! - [`ordered_trie_root`]: root of a list keyed by `rlp(index)`

#![warn(clippy::all)]

pub mod nibbles;
mod node;
mod secure;
mod trie;

pub use node::Node;
pub use secure::{ordered_trie_root, ordered_trie_root_of, SecureTrie};
pub use trie::Trie;

/// Root of the empty trie
pub use strata_crypto::KECCAK_NULL_RLP as EMPTY_ROOT;
