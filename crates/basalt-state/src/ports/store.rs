//! # Durable Store Port
//!
//! The trie boundary. The settlement core never sees trie nodes or hashing
//! internals; it consumes the store through this byte-keyed interface.
//! Keys are 20-byte account addresses, address‖slot pairs inside an
//! account's storage sub-space, or 32-byte code hashes.

use crate::error::StateError;
use basalt_types::{Address, Hash, StorageKey};

/// Durable key-value store abstraction (the external trie).
pub trait DurableStore: Send {
    /// Reads the value for a key, if present.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Writes a key-value pair.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StateError>;

    /// Removes a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError>;

    /// Saves a restore point covering every later mutation.
    fn checkpoint(&mut self);

    /// Accepts all mutations since the matching checkpoint.
    fn commit(&mut self) -> Result<(), StateError>;

    /// Discards all mutations since the matching checkpoint.
    fn revert(&mut self) -> Result<(), StateError>;

    /// Deterministic commitment over the full store contents.
    fn root_hash(&self) -> Hash;
}

/// Key for an account entry: the raw address bytes.
#[must_use]
pub fn account_key(address: Address) -> Vec<u8> {
    address.as_bytes().to_vec()
}

/// Key for one slot in an account's storage sub-space: address ‖ slot.
#[must_use]
pub fn storage_slot_key(address: Address, slot: StorageKey) -> Vec<u8> {
    let mut key = Vec::with_capacity(52);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(slot.as_bytes());
    key
}

/// Key for a code blob: its hash.
#[must_use]
pub fn code_key(hash: Hash) -> Vec<u8> {
    hash.as_bytes().to_vec()
}

// =============================================================================
// TESTS
// =============================================================================
