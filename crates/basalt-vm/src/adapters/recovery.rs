//! secp256k1 signature recovery over k256.

use crate::ports::outbound::SignatureRecovery;
use basalt_types::Hash;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Production recovery adapter backed by the k256 crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct K256Recovery;

impl SignatureRecovery for K256Recovery {
    fn recover_public_key(
        &self,
        message_hash: &Hash,
        recovery_id: u8,
        r: &[u8; 32],
        s: &[u8; 32],
    ) -> Option<[u8; 64]> {
        let recovery_id = RecoveryId::from_byte(recovery_id)?;

        let mut signature_bytes = [0u8; 64];
        signature_bytes[..32].copy_from_slice(r);
        signature_bytes[32..].copy_from_slice(s);
        let signature = Signature::from_slice(&signature_bytes).ok()?;

        let key =
            VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &signature, recovery_id)
                .ok()?;

        // SEC1 uncompressed form: 0x04 prefix followed by x ‖ y
        let point = key.to_encoded_point(false);
        let bytes = point.as_bytes();
        if bytes.len() != 65 {
            return None;
        }
        let mut public_key = [0u8; 64];
        public_key.copy_from_slice(&bytes[1..]);
        Some(public_key)
    }
}

// =============================================================================
// TESTS
// =============================================================================
