//! # strata-state
//!
//! In-memory Ethereum world state.
//!
//! - [`WorldState`]: accounts, storage and code with nested checkpoints
//! - [`Account`] / [`TrieAccount`]: account records and their trie leaves
//! - [`Alloc`]: genesis-style JSON snapshots

#![warn(clippy::all)]

mod account;
mod error;
mod snapshot;
mod state;

pub use account::{Account, TrieAccount, EMPTY_CODE_HASH, EMPTY_STORAGE_ROOT};
pub use error::{StateError, StateResult};
pub use snapshot::{Alloc, AllocAccount, HexBytes, HexU256, HexU64};
pub use state::WorldState;
