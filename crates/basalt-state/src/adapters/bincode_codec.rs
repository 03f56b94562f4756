//! Bincode-backed account codec.

use crate::error::StateError;
use crate::ports::codec::AccountCodec;
use basalt_types::Account;

/// Codec adapter using the workspace's bincode layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl AccountCodec for BincodeCodec {
    fn encode_account(&self, account: &Account) -> Result<Vec<u8>, StateError> {
        bincode::serialize(account).map_err(|e| StateError::Codec(e.to_string()))
    }

    fn decode_account(&self, bytes: &[u8]) -> Result<Account, StateError> {
        bincode::deserialize(bytes).map_err(|e| StateError::Codec(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
