//! In-memory durable-store implementation for testing and local replay.
//! Production deployments back this port with the node's trie database.

use crate::error::StateError;
use crate::ports::store::DurableStore;
use basalt_types::Hash;
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;

/// Sorted in-memory store with a snapshot stack.
///
/// The root hash is the Keccak-256 over all entries in key order, so two
/// stores with equal contents report equal roots regardless of write order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    snapshots: Vec<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DurableStore for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StateError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.entries.remove(key);
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.snapshots.push(self.entries.clone());
    }

    fn commit(&mut self) -> Result<(), StateError> {
        self.snapshots.pop().ok_or(StateError::NoCheckpoint)?;
        Ok(())
    }

    fn revert(&mut self) -> Result<(), StateError> {
        let snapshot = self.snapshots.pop().ok_or(StateError::NoCheckpoint)?;
        self.entries = snapshot;
        Ok(())
    }

    fn root_hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        for (key, value) in &self.entries {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
        Hash::new(hasher.finalize().into())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_delete() {
        let mut store = InMemoryStore::new();
        store.put(vec![1], vec![10]).unwrap();
        assert_eq!(store.get(&[1]).unwrap(), Some(vec![10]));

        store.delete(&[1]).unwrap();
        assert_eq!(store.get(&[1]).unwrap(), None);
    }

    #[test]
    fn test_revert_restores_snapshot() {
        let mut store = InMemoryStore::new();
        store.put(vec![1], vec![10]).unwrap();

        store.checkpoint();
        store.put(vec![2], vec![20]).unwrap();
        store.delete(&[1]).unwrap();
        store.revert().unwrap();

        assert_eq!(store.get(&[1]).unwrap(), Some(vec![10]));
        assert_eq!(store.get(&[2]).unwrap(), None);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut store = InMemoryStore::new();
        store.checkpoint();
        store.put(vec![1], vec![10]).unwrap();
        store.commit().unwrap();
        assert_eq!(store.get(&[1]).unwrap(), Some(vec![10]));
    }

    #[test]
    fn test_resolve_without_checkpoint_fails() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.commit(), Err(StateError::NoCheckpoint));
        assert_eq!(store.revert(), Err(StateError::NoCheckpoint));
    }

    #[test]
    fn test_root_hash_is_order_independent() {
        let mut a = InMemoryStore::new();
        a.put(vec![1], vec![10]).unwrap();
        a.put(vec![2], vec![20]).unwrap();

        let mut b = InMemoryStore::new();
        b.put(vec![2], vec![20]).unwrap();
        b.put(vec![1], vec![10]).unwrap();

        assert_eq!(a.root_hash(), b.root_hash());
    }

    #[test]
    fn test_root_hash_tracks_contents() {
        let mut store = InMemoryStore::new();
        let empty_root = store.root_hash();

        store.put(vec![1], vec![10]).unwrap();
        let one_root = store.root_hash();
        assert_ne!(empty_root, one_root);

        store.delete(&[1]).unwrap();
        assert_eq!(store.root_hash(), empty_root);
    }
}
