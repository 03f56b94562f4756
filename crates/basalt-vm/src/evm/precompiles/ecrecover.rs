//! # Recovery Precompile (0x01)
//!
//! Recovers the signer address from an ECDSA signature.
//!
//! Input layout (128 bytes, zero-padded):
//! - bytes 0-31: message hash
//! - bytes 32-63: v (27 or 28 in the final byte)
//! - bytes 64-95: r
//! - bytes 96-127: s
//!
//! Output: the recovered address left-padded to 32 bytes, or empty when the
//! signature does not recover.

use super::PrecompileOutput;
use crate::errors::PrecompileError;
use crate::ports::outbound::SignatureRecovery;
use basalt_types::{Bytes, Hash, RecoverableSignature};

/// Fixed fee.
const ECRECOVER_GAS: u64 = 3000;

/// Runs the recovery routine.
pub fn execute(
    input: &[u8],
    gas_limit: u64,
    recovery: &dyn SignatureRecovery,
) -> Result<PrecompileOutput, PrecompileError> {
    if ECRECOVER_GAS > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }

    let mut padded = [0u8; 128];
    let len = input.len().min(128);
    padded[..len].copy_from_slice(&input[..len]);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&padded[0..32]);
    let v = padded[63];
    let mut r = [0u8; 32];
    r.copy_from_slice(&padded[64..96]);
    let mut s = [0u8; 32];
    s.copy_from_slice(&padded[96..128]);

    // Malformed v or an unrecoverable signature returns empty, not an error
    let output = if padded[32..63].iter().any(|&b| b != 0) || (v != 27 && v != 28) {
        Bytes::new()
    } else {
        let signature = RecoverableSignature::new(v, r, s);
        match recovery.recover_address(&Hash::new(hash), &signature) {
            Some(address) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(address.as_bytes());
                Bytes::from_slice(&word)
            }
            None => Bytes::new(),
        }
    };

    Ok(PrecompileOutput {
        gas_used: ECRECOVER_GAS,
        output,
    })
}

// =============================================================================
// TESTS
// =============================================================================
