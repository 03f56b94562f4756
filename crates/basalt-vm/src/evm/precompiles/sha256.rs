//! # SHA-256 Precompile (0x02)
//!
//! Fee: 60 base + 12 per input word.

use super::PrecompileOutput;
use crate::errors::PrecompileError;
use basalt_types::Bytes;
use sha2::{Digest, Sha256};

const SHA256_BASE_GAS: u64 = 60;
const SHA256_WORD_GAS: u64 = 12;

/// Runs the SHA-256 routine.
pub fn execute(input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
    let gas = SHA256_BASE_GAS + SHA256_WORD_GAS * input.len().div_ceil(32) as u64;
    if gas > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }

    let digest = Sha256::digest(input);
    Ok(PrecompileOutput {
        gas_used: gas,
        output: Bytes::from_slice(&digest),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256("abc") = ba7816bf...
        let result = execute(b"abc", 100_000).unwrap();
        assert_eq!(
            &result.output.as_slice()[..4],
            &[0xba, 0x78, 0x16, 0xbf]
        );
        assert_eq!(result.gas_used, SHA256_BASE_GAS + SHA256_WORD_GAS);
    }

    #[test]
    fn test_fee_scales_with_words() {
        let result = execute(&[0u8; 33], 100_000).unwrap();
        assert_eq!(result.gas_used, SHA256_BASE_GAS + 2 * SHA256_WORD_GAS);
    }

    #[test]
    fn test_out_of_gas() {
        assert!(matches!(
            execute(b"abc", 10),
            Err(PrecompileError::OutOfGas)
        ));
    }
}
