//! # State Cache
//!
//! Ordered overlay from address to `(Account, modified)` plus a storage-slot
//! overlay, a pending-deletions list, and a checkpoint stack. Owns exclusive
//! mutation rights while a call tree executes; the durable store is touched
//! only on load-through and on [`StateCache::flush`].
//!
//! ## Invariants
//! - A read miss loads through from the durable store and inserts the entry
//!   unmodified (the implicit zero account when the store has nothing).
//! - `checkpoint()` pushes a full snapshot; `revert()` pops and restores it;
//!   `commit()` pops and keeps the live state.
//! - `flush()` writes every modified entry, applies pending deletions, then
//!   clears modified flags and the deletions list.

use crate::error::StateError;
use crate::ports::codec::AccountCodec;
use crate::ports::store::{account_key, code_key, storage_slot_key, DurableStore};
use basalt_types::{keccak256, Account, Address, Bytes, Hash, StorageKey, StorageValue, U256};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug)]
struct CacheEntry {
    account: Account,
    modified: bool,
}

#[derive(Clone, Debug)]
struct SlotEntry {
    value: StorageValue,
    modified: bool,
}

#[derive(Clone)]
struct Snapshot {
    accounts: BTreeMap<Address, CacheEntry>,
    storage: BTreeMap<(Address, StorageKey), SlotEntry>,
    code: BTreeMap<Hash, Bytes>,
    pending_deletions: Vec<Address>,
}

/// Checkpointable account-state overlay over a durable store.
pub struct StateCache {
    store: Box<dyn DurableStore>,
    codec: Box<dyn AccountCodec>,
    accounts: BTreeMap<Address, CacheEntry>,
    storage: BTreeMap<(Address, StorageKey), SlotEntry>,
    /// Code blobs written since the last flush, keyed by hash.
    code: BTreeMap<Hash, Bytes>,
    /// Addresses scheduled for durable deletion on the next flush.
    pending_deletions: Vec<Address>,
    checkpoints: Vec<Snapshot>,
}

impl StateCache {
    /// Creates a cache over the given store and codec.
    #[must_use]
    pub fn new(store: Box<dyn DurableStore>, codec: Box<dyn AccountCodec>) -> Self {
        Self {
            store,
            codec,
            accounts: BTreeMap::new(),
            storage: BTreeMap::new(),
            code: BTreeMap::new(),
            pending_deletions: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    // =========================================================================
    // ACCOUNT ACCESS
    // =========================================================================

    fn ensure_loaded(&mut self, address: Address) -> Result<&mut CacheEntry, StateError> {
        if !self.accounts.contains_key(&address) {
            let account = match self.store.get(&account_key(address))? {
                Some(bytes) => self.codec.decode_account(&bytes)?,
                None => Account::default(),
            };
            self.accounts.insert(
                address,
                CacheEntry {
                    account,
                    modified: false,
                },
            );
        }
        // Entry is present by construction
        Ok(self
            .accounts
            .get_mut(&address)
            .ok_or_else(|| StateError::Store("cache entry vanished".into()))?)
    }

    /// Current state of an account (the zero account if never touched).
    pub fn account(&mut self, address: Address) -> Result<Account, StateError> {
        Ok(self.ensure_loaded(address)?.account.clone())
    }

    /// Current balance of an account.
    pub fn balance(&mut self, address: Address) -> Result<U256, StateError> {
        Ok(self.ensure_loaded(address)?.account.balance)
    }

    /// Current nonce of an account.
    pub fn nonce(&mut self, address: Address) -> Result<u64, StateError> {
        Ok(self.ensure_loaded(address)?.account.nonce)
    }

    /// Whether the cache has a modified entry for the address.
    #[must_use]
    pub fn is_modified(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(|entry| entry.modified)
    }

    /// Whether the address is scheduled for deletion on flush.
    #[must_use]
    pub fn is_marked_for_deletion(&self, address: Address) -> bool {
        self.pending_deletions.contains(&address)
    }

    // =========================================================================
    // ACCOUNT MUTATION
    // =========================================================================

    /// Adds to an account's balance, creating the account if absent.
    pub fn credit(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let entry = self.ensure_loaded(address)?;
        entry.account.credit(amount);
        entry.modified = true;
        Ok(())
    }

    /// Subtracts from an account's balance.
    ///
    /// # Errors
    ///
    /// `InsufficientBalance` without mutation if the balance is too small.
    pub fn debit(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let entry = self.ensure_loaded(address)?;
        entry.account.debit(amount)?;
        entry.modified = true;
        Ok(())
    }

    /// Moves value between two accounts, creating the recipient if absent.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), StateError> {
        self.debit(from, value)?;
        self.credit(to, value)
    }

    /// Bumps an account's nonce by one.
    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let entry = self.ensure_loaded(address)?;
        entry.account.nonce += 1;
        entry.modified = true;
        Ok(())
    }

    /// Installs code on an account; the blob is persisted on flush.
    pub fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError> {
        let hash = keccak256(code.as_slice());
        let entry = self.ensure_loaded(address)?;
        entry.account.code_hash = hash;
        entry.modified = true;
        if !code.is_empty() {
            self.code.insert(hash, code);
        }
        Ok(())
    }

    /// The code an account executes (empty for non-contract accounts).
    pub fn code(&mut self, address: Address) -> Result<Bytes, StateError> {
        let hash = self.ensure_loaded(address)?.account.code_hash;
        if hash == Account::EMPTY_CODE_HASH {
            return Ok(Bytes::new());
        }
        if let Some(code) = self.code.get(&hash) {
            return Ok(code.clone());
        }
        match self.store.get(&code_key(hash))? {
            Some(bytes) => Ok(Bytes::from_vec(bytes)),
            None => Ok(Bytes::new()),
        }
    }

    // =========================================================================
    // STORAGE ACCESS
    // =========================================================================

    /// Reads one slot of an account's storage sub-space.
    pub fn storage(
        &mut self,
        address: Address,
        slot: StorageKey,
    ) -> Result<StorageValue, StateError> {
        if let Some(entry) = self.storage.get(&(address, slot)) {
            return Ok(entry.value);
        }
        let value = match self.store.get(&storage_slot_key(address, slot))? {
            Some(bytes) => StorageValue::from_slice(&bytes),
            None => StorageValue::ZERO,
        };
        self.storage.insert(
            (address, slot),
            SlotEntry {
                value,
                modified: false,
            },
        );
        Ok(value)
    }

    /// Writes one slot of an account's storage sub-space.
    pub fn set_storage(
        &mut self,
        address: Address,
        slot: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError> {
        self.storage.insert(
            (address, slot),
            SlotEntry {
                value,
                modified: true,
            },
        );
        // The owning account is rewritten on flush so its storage root follows
        self.ensure_loaded(address)?.modified = true;
        Ok(())
    }

    // =========================================================================
    // DELETION (SELFDESTRUCT)
    // =========================================================================

    /// Destroys an account: its whole balance moves to the beneficiary, the
    /// entry leaves the cache, and durable deletion is scheduled for the next
    /// flush.
    pub fn delete_account(
        &mut self,
        address: Address,
        beneficiary: Address,
    ) -> Result<(), StateError> {
        let balance = self.balance(address)?;
        self.credit(beneficiary, balance)?;
        self.accounts.remove(&address);
        self.storage.retain(|(owner, _), _| *owner != address);
        self.pending_deletions.push(address);
        debug!(target: "state", account = %address, beneficiary = %beneficiary, "account scheduled for deletion");
        Ok(())
    }

    // =========================================================================
    // CHECKPOINTS
    // =========================================================================

    /// Pushes a full snapshot of the live overlay.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(Snapshot {
            accounts: self.accounts.clone(),
            storage: self.storage.clone(),
            code: self.code.clone(),
            pending_deletions: self.pending_deletions.clone(),
        });
    }

    /// Pops the latest checkpoint and restores it, discarding everything done
    /// since.
    pub fn revert(&mut self) -> Result<(), StateError> {
        let snapshot = self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        self.accounts = snapshot.accounts;
        self.storage = snapshot.storage;
        self.code = snapshot.code;
        self.pending_deletions = snapshot.pending_deletions;
        Ok(())
    }

    /// Pops the latest checkpoint, keeping the live state.
    pub fn commit(&mut self) -> Result<(), StateError> {
        self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        Ok(())
    }

    /// Number of unresolved checkpoints.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    // =========================================================================
    // FLUSH & STORE PASSTHROUGH
    // =========================================================================

    /// Writes every modified entry through the codec to the durable store,
    /// applies pending deletions, and clears both.
    pub fn flush(&mut self) -> Result<(), StateError> {
        let mut written = 0usize;
        for (address, entry) in &mut self.accounts {
            if entry.modified {
                let bytes = self.codec.encode_account(&entry.account)?;
                self.store.put(account_key(*address), bytes)?;
                entry.modified = false;
                written += 1;
            }
        }
        for ((address, slot), entry) in &mut self.storage {
            if entry.modified {
                let key = storage_slot_key(*address, *slot);
                if entry.value.is_zero() {
                    self.store.delete(&key)?;
                } else {
                    self.store.put(key, entry.value.as_bytes().to_vec())?;
                }
                entry.modified = false;
            }
        }
        for (hash, code) in std::mem::take(&mut self.code) {
            self.store.put(code_key(hash), code.into_vec())?;
        }
        for address in std::mem::take(&mut self.pending_deletions) {
            self.store.delete(&account_key(address))?;
        }
        debug!(target: "state", accounts = written, "cache flushed");
        Ok(())
    }

    /// Drops every cached entry and unresolved checkpoint. Used after a
    /// block-level revert leaves the cache stale.
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.storage.clear();
        self.code.clear();
        self.pending_deletions.clear();
        self.checkpoints.clear();
    }

    /// Saves a restore point in the underlying store.
    pub fn checkpoint_store(&mut self) {
        self.store.checkpoint();
    }

    /// Accepts flushed writes in the underlying store.
    pub fn commit_store(&mut self) -> Result<(), StateError> {
        self.store.commit()
    }

    /// Discards flushed writes in the underlying store.
    pub fn revert_store(&mut self) -> Result<(), StateError> {
        self.store.revert()
    }

    /// Commitment over the durable store contents.
    #[must_use]
    pub fn root_hash(&self) -> Hash {
        self.store.root_hash()
    }
}

// =============================================================================
// TESTS
// =============================================================================
