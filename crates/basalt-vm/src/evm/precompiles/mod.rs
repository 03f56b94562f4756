//! # Precompiled Contracts
//!
//! Fixed registry of built-in routines at reserved low addresses. Dispatch
//! happens before any code lookup: a call targeting a registry address runs
//! the routine instead of bytecode. Each routine charges a fixed base fee
//! plus an input-size-proportional fee; insufficient gas yields the same
//! OutOfGas call-result shape as ordinary execution.

pub mod ecrecover;
pub mod ripemd160;
pub mod sha256;

use crate::errors::PrecompileError;
use crate::ports::outbound::SignatureRecovery;
use basalt_types::{Address, Bytes};

/// Result of one precompile run.
pub struct PrecompileOutput {
    /// Gas consumed.
    pub gas_used: u64,
    /// Output data.
    pub output: Bytes,
}

/// Highest address occupied by the registry.
const REGISTRY_TOP: u8 = 3;

/// Returns true if the address belongs to the registry (0x01-0x03).
#[must_use]
pub fn is_precompile(address: Address) -> bool {
    address.as_bytes()[..19] == [0u8; 19] && (1..=REGISTRY_TOP).contains(&address.as_bytes()[19])
}

/// Runs the registry routine for `address`, or `None` if the address is not
/// a precompile.
#[must_use]
pub fn dispatch(
    address: Address,
    input: &[u8],
    gas_limit: u64,
    recovery: &dyn SignatureRecovery,
) -> Option<Result<PrecompileOutput, PrecompileError>> {
    if !is_precompile(address) {
        return None;
    }
    Some(match address.as_bytes()[19] {
        1 => ecrecover::execute(input, gas_limit, recovery),
        2 => sha256::execute(input, gas_limit),
        _ => ripemd160::execute(input, gas_limit),
    })
}

// =============================================================================
// TESTS
// =============================================================================
