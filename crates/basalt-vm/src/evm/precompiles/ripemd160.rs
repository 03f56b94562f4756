//! # RIPEMD-160 Precompile (0x03)
//!
//! Fee: 600 base + 120 per input word. The 20-byte digest is left-padded to
//! a 32-byte word.

use super::PrecompileOutput;
use crate::errors::PrecompileError;
use basalt_types::Bytes;
use ripemd::{Digest, Ripemd160};

const RIPEMD_BASE_GAS: u64 = 600;
const RIPEMD_WORD_GAS: u64 = 120;

/// Runs the RIPEMD-160 routine.
pub fn execute(input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
    let gas = RIPEMD_BASE_GAS + RIPEMD_WORD_GAS * input.len().div_ceil(32) as u64;
    if gas > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }

    let digest = Ripemd160::digest(input);
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&digest);
    Ok(PrecompileOutput {
        gas_used: gas,
        output: Bytes::from_slice(&word),
    })
}

// =============================================================================
// TESTS
// =============================================================================
