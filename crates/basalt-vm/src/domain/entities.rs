//! # Execution Entities
//!
//! The parameters of one interpreter invocation and the result it hands back
//! up the call tree.

use crate::errors::VmError;
use basalt_types::{Address, BlockContext, Bytes, Log, U256};

// =============================================================================
// EXECUTION CONTEXT
// =============================================================================

/// Parameters of one interpreter invocation.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Address that initiated the outermost transaction.
    pub origin: Address,
    /// Immediate caller of this frame.
    pub caller: Address,
    /// Account being executed against.
    pub address: Address,
    /// Value carried by this call.
    pub value: U256,
    /// Input data (calldata; empty for init-code frames).
    pub data: Bytes,
    /// Gas limit for this frame.
    pub gas_limit: u64,
    /// Gas price of the enclosing transaction.
    pub gas_price: U256,
    /// Block-level context, read-only to the interpreter.
    pub block: BlockContext,
    /// Call depth: 0 at the outer transaction, +1 per nested frame.
    pub depth: u16,
}

impl ExecutionContext {
    /// Context for the outermost frame of a transaction.
    #[must_use]
    pub fn new_transaction(
        origin: Address,
        to: Address,
        value: U256,
        data: Bytes,
        gas_limit: u64,
        gas_price: U256,
        block: BlockContext,
    ) -> Self {
        Self {
            origin,
            caller: origin,
            address: to,
            value,
            data,
            gas_limit,
            gas_price,
            block,
            depth: 0,
        }
    }

    /// Child context for a nested call at `depth + 1`.
    #[must_use]
    pub fn child(
        &self,
        caller: Address,
        address: Address,
        value: U256,
        data: Bytes,
        gas_limit: u64,
    ) -> Self {
        Self {
            origin: self.origin,
            caller,
            address,
            value,
            data,
            gas_limit,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            origin: Address::ZERO,
            caller: Address::ZERO,
            address: Address::ZERO,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 0,
            gas_price: U256::zero(),
            block: BlockContext::default(),
            depth: 0,
        }
    }
}

// =============================================================================
// CALL RESULT
// =============================================================================

/// Outcome of one dispatcher/interpreter invocation.
///
/// Each level of the call tree decides what to keep, discard, or re-raise
/// from the result it receives.
#[derive(Clone, Debug, Default)]
pub struct CallResult {
    /// Gas consumed by the frame (the full limit when the frame ran out).
    pub gas_used: u64,
    /// Storage-clear refund accumulated by surviving frames.
    pub gas_refund: u64,
    /// The exception that failed the frame, if any.
    pub error: Option<VmError>,
    /// Return data (empty on failure).
    pub return_data: Bytes,
    /// Logs emitted by this frame and its committed sub-frames.
    pub logs: Vec<Log>,
    /// Beneficiary of a SELFDESTRUCT performed by this frame.
    pub selfdestruct: Option<Address>,
    /// Address of the account created by a CREATE frame.
    pub created_address: Option<Address>,
}

impl CallResult {
    /// A successful result carrying return data.
    #[must_use]
    pub fn success(return_data: Bytes, gas_used: u64) -> Self {
        Self {
            gas_used,
            return_data,
            ..Self::default()
        }
    }

    /// A failed result; return data and logs are dropped with the frame.
    #[must_use]
    pub fn failure(error: VmError, gas_used: u64) -> Self {
        Self {
            gas_used,
            error: Some(error),
            ..Self::default()
        }
    }

    /// True if the frame completed without exception.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// VM CONFIGURATION
// =============================================================================

/// Execution limits.
#[derive(Clone, Debug)]
pub struct VmConfig {
    /// Maximum call depth.
    pub max_call_depth: u16,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_context_increments_depth_and_keeps_origin() {
        let parent = ExecutionContext {
            origin: Address::new([1u8; 20]),
            caller: Address::new([1u8; 20]),
            address: Address::new([2u8; 20]),
            depth: 3,
            ..ExecutionContext::default()
        };

        let child = parent.child(
            Address::new([2u8; 20]),
            Address::new([3u8; 20]),
            U256::from(50),
            Bytes::new(),
            500,
        );

        assert_eq!(child.origin, parent.origin);
        assert_eq!(child.caller, Address::new([2u8; 20]));
        assert_eq!(child.address, Address::new([3u8; 20]));
        assert_eq!(child.depth, 4);
    }

    #[test]
    fn test_call_result_success_and_failure() {
        let ok = CallResult::success(Bytes::from_slice(&[1, 2]), 100);
        assert!(ok.is_success());
        assert_eq!(ok.gas_used, 100);

        let failed = CallResult::failure(VmError::StackUnderflow, 40);
        assert!(!failed.is_success());
        assert!(failed.return_data.is_empty());
        assert!(failed.logs.is_empty());
    }
}
