//! # Codec Port
//!
//! Round-trip between an [`Account`] and its canonical persisted byte layout.
//! The byte grammar itself belongs to the persistence layer; the core only
//! requires that decode ∘ encode is the identity.

use crate::error::StateError;
use basalt_types::Account;

/// Canonical account serialization boundary.
pub trait AccountCodec: Send {
    /// Encodes an account to its persisted layout.
    fn encode_account(&self, account: &Account) -> Result<Vec<u8>, StateError>;

    /// Decodes an account from its persisted layout.
    fn decode_account(&self, bytes: &[u8]) -> Result<Account, StateError>;
}
