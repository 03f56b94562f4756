//! # Transaction Entity
//!
//! A signed state-transition request. Immutable once parsed; the sender
//! address is derived from the signature by the processing layer and cached
//! here so recovery runs at most once.

use crate::primitives::{Address, Bytes, Hash, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::sync::OnceLock;

// =============================================================================
// RECOVERABLE SIGNATURE
// =============================================================================

/// ECDSA signature (v, r, s) over the transaction's signing hash.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RecoverableSignature {
    /// Recovery id (0 or 1, or 27/28 in legacy form).
    pub v: u8,
    /// r component (32 bytes).
    pub r: [u8; 32],
    /// s component (32 bytes).
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Creates a new signature.
    #[must_use]
    pub const fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// Normalizes v to 0 or 1.
    #[must_use]
    pub const fn normalized_v(&self) -> u8 {
        if self.v >= 27 {
            self.v - 27
        } else {
            self.v
        }
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// A signed transaction.
///
/// `to == None` requests contract creation; the payload is then the
/// initialization code rather than calldata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender nonce this transaction consumes.
    pub nonce: u64,
    /// Price per unit of gas.
    pub gas_price: U256,
    /// Maximum gas the sender is willing to buy.
    pub gas_limit: u64,
    /// Recipient; absent for contract creation.
    pub to: Option<Address>,
    /// Value transferred to the recipient (or creation endowment).
    pub value: U256,
    /// Calldata or initialization code.
    pub data: Bytes,
    /// Recoverable signature over [`Transaction::signing_hash`].
    pub signature: RecoverableSignature,
    /// Sender address, filled in once recovery has run.
    #[serde(skip)]
    sender: OnceLock<Address>,
}

impl Transaction {
    /// Creates a transaction from its parsed fields.
    #[must_use]
    pub fn new(
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        signature: RecoverableSignature,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            signature,
            sender: OnceLock::new(),
        }
    }

    /// Returns true if this transaction creates a contract.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Hash over the unsigned fields; the message the signature commits to.
    #[must_use]
    pub fn signing_hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.nonce.to_be_bytes());
        let mut gas_price = [0u8; 32];
        self.gas_price.to_big_endian(&mut gas_price);
        hasher.update(gas_price);
        hasher.update(self.gas_limit.to_be_bytes());
        match self.to {
            Some(to) => {
                hasher.update([0x01]);
                hasher.update(to.as_bytes());
            }
            None => hasher.update([0x00]),
        }
        let mut value = [0u8; 32];
        self.value.to_big_endian(&mut value);
        hasher.update(value);
        hasher.update(self.data.as_slice());
        Hash::new(hasher.finalize().into())
    }

    /// Hash over the full transaction, signature included.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.signing_hash().as_bytes());
        hasher.update([self.signature.v]);
        hasher.update(self.signature.r);
        hasher.update(self.signature.s);
        Hash::new(hasher.finalize().into())
    }

    /// Sender address, if recovery has already run.
    #[must_use]
    pub fn cached_sender(&self) -> Option<Address> {
        self.sender.get().copied()
    }

    /// Caches the recovered sender. Later calls keep the first value.
    pub fn cache_sender(&self, sender: Address) {
        let _ = self.sender.set(sender);
    }
}

// =============================================================================
// TESTS
// =============================================================================
