//! Journaled in-memory world state

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::error::{StateError, StateResult};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use strata_crypto::keccak256;
use strata_primitives::{Address, H256, U256};
use strata_rlp::encode;
use strata_trie::SecureTrie;
use tracing::trace;

/// Undo record for one mutation
#[derive(Clone, Debug)]
enum JournalEntry {
    Account {
        address: Address,
        previous: Option<Account>,
    },
    Storage {
        address: Address,
        key: H256,
        previous: U256,
    },
    StorageCleared {
        address: Address,
        previous: BTreeMap<H256, U256>,
    },
}

/// Accounts, storage and code, with nested checkpoints.
///
/// Every mutation made while a checkpoint is open is recorded in an undo
/// log; [`WorldState::revert_to_checkpoint`] replays it backwards and
/// [`WorldState::commit_checkpoint`] folds it into the enclosing checkpoint.
/// Storage slots holding zero are never stored.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    accounts: BTreeMap<Address, Account>,
    storage: BTreeMap<Address, BTreeMap<H256, U256>>,
    codes: HashMap<H256, Bytes>,
    journal: Vec<JournalEntry>,
    checkpoints: Vec<usize>,
    /// Slot values at the start of the current transaction, recorded on first write
    original_storage: HashMap<(Address, H256), U256>,
    /// Accounts created during the current transaction
    created_accounts: HashSet<Address>,
}

impl WorldState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Transaction scope ====================

    /// Reset per-transaction bookkeeping
    pub fn begin_transaction(&mut self) {
        self.journal.clear();
        self.checkpoints.clear();
        self.original_storage.clear();
        self.created_accounts.clear();
    }

    /// Open a nested checkpoint
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    /// Undo everything since the innermost checkpoint and close it
    pub fn revert_to_checkpoint(&mut self) -> StateResult<()> {
        let mark = self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        let undone = self.journal.len() - mark;
        while self.journal.len() > mark {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Account { address, previous } => match previous {
                    Some(account) => {
                        self.accounts.insert(address, account);
                    }
                    None => {
                        self.accounts.remove(&address);
                    }
                },
                JournalEntry::Storage {
                    address,
                    key,
                    previous,
                } => self.write_slot(address, key, previous),
                JournalEntry::StorageCleared { address, previous } => {
                    if previous.is_empty() {
                        self.storage.remove(&address);
                    } else {
                        self.storage.insert(address, previous);
                    }
                }
            }
        }
        trace!(undone, depth = self.checkpoints.len(), "Reverted checkpoint");
        Ok(())
    }

    /// Keep everything since the innermost checkpoint and close it
    pub fn commit_checkpoint(&mut self) -> StateResult<()> {
        self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
        Ok(())
    }

    fn record(&mut self, entry: JournalEntry) {
        if !self.checkpoints.is_empty() {
            self.journal.push(entry);
        }
    }

    // ==================== Accounts ====================

    /// Get account by address
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Account, or an empty one if it does not exist
    pub fn account_or_default(&self, address: &Address) -> Account {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    /// Check if account exists
    pub fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Exists and is not empty (EIP-161 "alive")
    pub fn is_account_alive(&self, address: &Address) -> bool {
        self.accounts
            .get(address)
            .is_some_and(|account| !account.is_empty())
    }

    /// Exists and is empty
    pub fn account_exists_and_is_empty(&self, address: &Address) -> bool {
        self.accounts
            .get(address)
            .is_some_and(|account| account.is_empty())
    }

    /// Has code or a non-zero nonce: the CREATE collision condition
    pub fn account_has_code_or_nonce(&self, address: &Address) -> bool {
        self.accounts
            .get(address)
            .is_some_and(|account| account.nonce != 0 || account.has_code())
    }

    /// Replace or remove an account record; storage is left alone
    pub fn set_account(&mut self, address: Address, account: Option<Account>) {
        let previous = match account {
            Some(account) => self.accounts.insert(address, account),
            None => self.accounts.remove(&address),
        };
        self.record(JournalEntry::Account { address, previous });
    }

    fn update_account(&mut self, address: &Address, f: impl FnOnce(&mut Account)) {
        let mut account = self.account_or_default(address);
        f(&mut account);
        self.set_account(*address, Some(account));
    }

    /// Create an empty account if none exists
    pub fn touch_account(&mut self, address: &Address) {
        if !self.account_exists(address) {
            self.set_account(*address, Some(Account::new()));
        }
    }

    /// Remove an account together with its storage
    pub fn destroy_account(&mut self, address: &Address) {
        self.destroy_storage(address);
        self.set_account(*address, None);
    }

    /// Remove every storage slot of an account
    pub fn destroy_storage(&mut self, address: &Address) {
        if let Some(previous) = self.storage.remove(address) {
            for (key, value) in &previous {
                self.original_storage
                    .entry((*address, *key))
                    .or_insert(*value);
            }
            self.record(JournalEntry::StorageCleared {
                address: *address,
                previous,
            });
        }
    }

    /// Remember that `address` was created in the current transaction
    pub fn mark_account_created(&mut self, address: Address) {
        self.created_accounts.insert(address);
    }

    /// Whether `address` was created in the current transaction
    pub fn is_created(&self, address: &Address) -> bool {
        self.created_accounts.contains(address)
    }

    /// Increment the nonce
    pub fn increment_nonce(&mut self, address: &Address) -> StateResult<()> {
        let mut account = self.account_or_default(address);
        account.nonce = account
            .nonce
            .checked_add(1)
            .ok_or(StateError::NonceOverflow(*address))?;
        self.set_account(*address, Some(account));
        Ok(())
    }

    /// Set the nonce
    pub fn set_nonce(&mut self, address: &Address, nonce: u64) {
        self.update_account(address, |account| account.nonce = nonce);
    }

    /// Get account balance
    pub fn balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    /// Set the balance, creating the account if needed
    pub fn set_balance(&mut self, address: &Address, balance: U256) {
        self.update_account(address, |account| account.balance = balance);
    }

    /// Add to balance
    pub fn add_balance(&mut self, address: &Address, amount: U256) -> StateResult<()> {
        let balance = self
            .balance(address)
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(*address))?;
        self.set_balance(address, balance);
        Ok(())
    }

    /// Subtract from balance
    pub fn sub_balance(&mut self, address: &Address, amount: U256) -> StateResult<()> {
        let available = self.balance(address);
        let balance = available
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance {
                address: *address,
                needed: amount,
                available,
            })?;
        self.set_balance(address, balance);
        Ok(())
    }

    /// Move `amount` wei between accounts
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> StateResult<()> {
        self.sub_balance(from, amount)?;
        self.add_balance(to, amount)
    }

    /// Iterate over all accounts in address order
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    // ==================== Code ====================

    /// Code of an account (empty if none)
    pub fn code(&self, address: &Address) -> Bytes {
        self.accounts
            .get(address)
            .map(|account| self.code_by_hash(&account.code_hash))
            .unwrap_or_default()
    }

    /// Code by hash (empty if unknown)
    pub fn code_by_hash(&self, code_hash: &H256) -> Bytes {
        if *code_hash == EMPTY_CODE_HASH {
            return Bytes::new();
        }
        self.codes.get(code_hash).cloned().unwrap_or_default()
    }

    /// Install code on an account
    pub fn set_code(&mut self, address: &Address, code: Bytes) {
        let code_hash = keccak256(&code);
        if !code.is_empty() {
            self.codes.entry(code_hash).or_insert(code);
        }
        self.update_account(address, |account| account.code_hash = code_hash);
    }

    // ==================== Storage ====================

    /// Current value of a storage slot
    pub fn storage(&self, address: &Address, key: &H256) -> U256 {
        self.storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or_default()
    }

    /// Value of a slot at the start of the current transaction (EIP-1283)
    pub fn original_storage(&self, address: &Address, key: &H256) -> U256 {
        if self.created_accounts.contains(address) {
            return U256::zero();
        }
        self.original_storage
            .get(&(*address, *key))
            .copied()
            .unwrap_or_else(|| self.storage(address, key))
    }

    /// Write a storage slot
    pub fn set_storage(&mut self, address: Address, key: H256, value: U256) {
        let previous = self.storage(&address, &key);
        self.original_storage
            .entry((address, key))
            .or_insert(previous);
        self.write_slot(address, key, value);
        self.record(JournalEntry::Storage {
            address,
            key,
            previous,
        });
    }

    fn write_slot(&mut self, address: Address, key: H256, value: U256) {
        if value.is_zero() {
            if let Some(slots) = self.storage.get_mut(&address) {
                slots.remove(&key);
                if slots.is_empty() {
                    self.storage.remove(&address);
                }
            }
        } else {
            self.storage.entry(address).or_default().insert(key, value);
        }
    }

    /// Non-zero slots of an account
    pub fn storage_of(&self, address: &Address) -> impl Iterator<Item = (&H256, &U256)> {
        self.storage.get(address).into_iter().flatten()
    }

    // ==================== Commitment ====================

    /// Root of an account's storage trie
    pub fn storage_root(&self, address: &Address) -> H256 {
        let mut trie = SecureTrie::new();
        for (key, value) in self.storage_of(address) {
            trie.put(key.as_bytes(), encode(value));
        }
        trie.root()
    }

    /// Root of the account trie
    pub fn state_root(&self) -> H256 {
        let mut trie = SecureTrie::new();
        for (address, account) in &self.accounts {
            let leaf = account.to_trie_account(self.storage_root(address));
            trie.put(address.as_bytes(), encode(&leaf));
        }
        trie.root()
    }
}
