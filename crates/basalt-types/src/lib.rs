//! # Basalt Types - Shared Chain Entities
//!
//! Value objects and entities shared by every crate of the Basalt settlement
//! core. These types represent concepts defined by their value (addresses,
//! hashes, words) and the chain entities built from them (accounts,
//! transactions, blocks, receipts).
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Primitives | `primitives.rs` | Address, Hash, Bytes, storage words |
//! | Account | `account.rs` | On-chain account entity |
//! | Transaction | `transaction.rs` | Signed transaction with cached sender |
//! | Block | `block.rs` | Header, body, context, receipt |
//! | Bloom | `bloom.rs` | 2048-bit logs bloom filter |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod account;
pub mod block;
pub mod bloom;
pub mod primitives;
pub mod transaction;

pub use account::Account;
pub use block::{Block, BlockContext, BlockHeader, Log, Receipt};
pub use bloom::LogsBloom;
pub use primitives::{Address, Bytes, Hash, StorageKey, StorageValue, U256};
pub use transaction::{RecoverableSignature, Transaction};

/// Computes the Keccak-256 hash of arbitrary data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    use sha3::{Digest, Keccak256};
    Hash::new(Keccak256::digest(data).into())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        // keccak256("") = c5d24601...
        let hash = keccak256(&[]);
        assert_eq!(hash.as_bytes()[0..4], [0xc5, 0xd2, 0x46, 0x01]);
    }
}
