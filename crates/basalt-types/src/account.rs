//! # Account Entity
//!
//! The on-chain identity of one address: nonce, balance, and references into
//! the account's storage sub-trie and immutable code.

use crate::primitives::{Hash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a balance mutation would underflow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("insufficient balance: required {required}, available {available}")]
pub struct BalanceUnderflow {
    /// Amount the operation needed.
    pub required: U256,
    /// Amount actually available.
    pub available: U256,
}

/// One address's on-chain state.
///
/// ## Invariants
/// - `balance` never goes negative; [`Account::debit`] rejects the mutation
///   before it happens.
/// - `is_contract()` ⇔ `code_hash` differs from the empty-code sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Number of transactions sent (or creations performed) by this account.
    pub nonce: u64,
    /// Balance in native-currency units.
    pub balance: U256,
    /// Root of this account's persistent key → word mapping.
    pub storage_root: Hash,
    /// Hash of the account's immutable bytecode, or the empty-code sentinel.
    pub code_hash: Hash,
}

impl Account {
    /// Keccak-256 of the empty byte string; the sentinel for "no code".
    pub const EMPTY_CODE_HASH: Hash = Hash([
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
        0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
        0xa4, 0x70,
    ]);

    /// Creates a plain (non-contract) account.
    #[must_use]
    pub fn new(balance: U256, nonce: u64) -> Self {
        Self {
            nonce,
            balance,
            storage_root: Hash::ZERO,
            code_hash: Self::EMPTY_CODE_HASH,
        }
    }

    /// Returns true if this account carries code.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.code_hash != Self::EMPTY_CODE_HASH
    }

    /// Returns true if the account is indistinguishable from a never-touched
    /// zero account.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && !self.is_contract()
    }

    /// Adds `amount` to the balance, saturating at the 256-bit ceiling.
    pub fn credit(&mut self, amount: U256) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Subtracts `amount` from the balance.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceUnderflow`] without mutating if the balance is too
    /// small.
    pub fn debit(&mut self, amount: U256) -> Result<(), BalanceUnderflow> {
        if self.balance < amount {
            return Err(BalanceUnderflow {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

impl Default for Account {
    /// The implicit zero account materialized on a read miss.
    fn default() -> Self {
        Self::new(U256::zero(), 0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
