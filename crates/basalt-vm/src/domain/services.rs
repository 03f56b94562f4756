//! # Domain Services
//!
//! Pure, deterministic functions: address derivation and intrinsic gas.
//! No I/O, no state access.

use crate::evm::gas::costs;
use basalt_types::{Address, Hash};
use sha3::{Digest, Keccak256};

// =============================================================================
// CONTRACT ADDRESS COMPUTATION
// =============================================================================

/// Computes the address of a contract created by `sender` at `nonce`.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12:\]
///
/// The nonce is the creator's nonce *before* the creation consumed it; the
/// dispatcher passes the pre-increment value.
#[must_use]
pub fn compute_contract_address(sender: Address, nonce: u64) -> Address {
    // RLP encode [sender, nonce]
    let mut content = Vec::with_capacity(32);

    // Address: 20-byte string (0x80 + 20 = 0x94)
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    // Nonce: minimal big-endian integer
    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 128 {
        content.push(nonce as u8);
    } else {
        let nonce_bytes = minimal_be(nonce);
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // List header; [address, nonce] always fits the short form
    let mut rlp_data = Vec::with_capacity(content.len() + 1);
    rlp_data.push(0xc0 + content.len() as u8);
    rlp_data.extend_from_slice(&content);

    let hash = Keccak256::digest(&rlp_data);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Big-endian bytes of `value` without leading zeros.
fn minimal_be(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// INTRINSIC GAS
// =============================================================================

/// Fixed cost of a transaction before any bytecode executes: the base fee
/// plus the per-byte payload fee.
#[must_use]
pub fn intrinsic_gas(data: &[u8]) -> u64 {
    costs::TX_BASE + costs::TX_DATA * data.len() as u64
}

// =============================================================================
// ADDRESS DERIVATION
// =============================================================================

/// Derives an account address from an uncompressed public key (64 bytes,
/// without the 0x04 prefix): keccak256(key)\[12:\].
#[must_use]
pub fn address_from_public_key(public_key: &[u8; 64]) -> Address {
    let hash = Keccak256::digest(public_key);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Computes keccak256 of data as a [`Hash`].
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    basalt_types::keccak256(data)
}

// =============================================================================
// TESTS
// =============================================================================
