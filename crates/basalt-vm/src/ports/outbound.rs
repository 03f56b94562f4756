//! # Driven Ports (Outbound)
//!
//! Interfaces the settlement core depends on. Adapters implement these; the
//! core never touches curve arithmetic directly.

use crate::domain::services::address_from_public_key;
use basalt_types::{Address, Hash, RecoverableSignature};

// =============================================================================
// SIGNATURE RECOVERY
// =============================================================================

/// Black-box "recover public key from hash + signature" primitive.
///
/// Used twice: to derive a transaction's sender and by the recovery
/// precompile.
pub trait SignatureRecovery: Send + Sync {
    /// Recovers the uncompressed public key (64 bytes, no 0x04 prefix) that
    /// signed `message_hash`, or `None` when the signature is unrecoverable.
    fn recover_public_key(
        &self,
        message_hash: &Hash,
        recovery_id: u8,
        r: &[u8; 32],
        s: &[u8; 32],
    ) -> Option<[u8; 64]>;

    /// Recovers the signer's account address.
    fn recover_address(
        &self,
        message_hash: &Hash,
        signature: &RecoverableSignature,
    ) -> Option<Address> {
        let key = self.recover_public_key(
            message_hash,
            signature.normalized_v(),
            &signature.r,
            &signature.s,
        )?;
        Some(address_from_public_key(&key))
    }
}
