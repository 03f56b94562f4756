//! # Error Types
//!
//! Error taxonomy for the settlement core, split by blast radius: frame-level
//! errors are absorbed by the failing call frame, transaction-level errors
//! reject the transaction before any mutation, block-level errors reject the
//! whole block.

use basalt_state::StateError;
use basalt_types::U256;
use thiserror::Error;

// =============================================================================
// FRAME-LEVEL ERRORS
// =============================================================================

/// Errors isolated to one call frame. The frame's checkpoint reverts, gas is
/// deducted, and the caller observes a failed call result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas; the frame forfeits its whole allotment.
    #[error("out of gas")]
    OutOfGas,

    /// Pop or depth check on too few stack items.
    #[error("stack underflow")]
    StackUnderflow,

    /// Push onto a full (1024-item) stack.
    #[error("stack overflow")]
    StackOverflow,

    /// Unassigned opcode byte.
    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpcode(u8),

    /// JUMP/JUMPI target is not a JUMPDEST marker.
    #[error("invalid jump destination: {0}")]
    InvalidJumpDestination(usize),

    /// Nested call would exceed the fixed depth limit.
    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded {
        /// Depth the call would have run at.
        depth: u16,
        /// Configured maximum.
        max: u16,
    },

    /// State plumbing failed underneath the frame.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl VmError {
    /// Returns true if the failing frame forfeits its entire gas allotment
    /// rather than only what it had spent.
    #[must_use]
    pub fn consumes_all_gas(&self) -> bool {
        matches!(self, Self::OutOfGas)
    }
}

// =============================================================================
// PRECOMPILE ERRORS
// =============================================================================

/// Errors from precompiled-contract execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// The registry fee exceeded the gas given to the call.
    #[error("precompile out of gas")]
    OutOfGas,
}

impl From<PrecompileError> for VmError {
    fn from(err: PrecompileError) -> Self {
        match err {
            PrecompileError::OutOfGas => Self::OutOfGas,
        }
    }
}

// =============================================================================
// TRANSACTION-LEVEL ERRORS
// =============================================================================

/// Errors that reject a transaction before any state mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The signature did not recover to any public key.
    #[error("invalid transaction signature")]
    InvalidSignature,

    /// Transaction nonce does not match the sender's account nonce.
    #[error("nonce mismatch: account {expected}, transaction {found}")]
    NonceMismatch {
        /// Sender's current account nonce.
        expected: u64,
        /// Nonce carried by the transaction.
        found: u64,
    },

    /// Gas limit below the intrinsic cost of the payload.
    #[error("gas limit {limit} below intrinsic cost {required}")]
    IntrinsicGasTooLow {
        /// Intrinsic cost of the transaction.
        required: u64,
        /// Gas limit offered.
        limit: u64,
    },

    /// Balance below `value + gas_price × gas_limit`.
    #[error("upfront cost {required} exceeds balance {available}")]
    UpfrontCost {
        /// Required upfront amount.
        required: U256,
        /// Sender balance.
        available: U256,
    },

    /// State plumbing failed during validation or settlement.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

// =============================================================================
// BLOCK-LEVEL ERRORS
// =============================================================================

/// Errors that reject a whole block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// A transaction in the block was itself invalid.
    #[error("transaction {index} rejected: {source}")]
    Transaction {
        /// Index of the offending transaction.
        index: usize,
        /// Why it was rejected.
        source: TxError,
    },

    /// Post-execution state root differs from the header.
    #[error("state root mismatch: header {expected}, computed {computed}")]
    StateRootMismatch {
        /// Root claimed by the header.
        expected: basalt_types::Hash,
        /// Root computed after execution.
        computed: basalt_types::Hash,
    },

    /// Post-execution receipts root differs from the header.
    #[error("receipts root mismatch: header {expected}, computed {computed}")]
    ReceiptsRootMismatch {
        /// Root claimed by the header.
        expected: basalt_types::Hash,
        /// Root computed after execution.
        computed: basalt_types::Hash,
    },

    /// Accumulated logs bloom differs from the header.
    #[error("logs bloom mismatch")]
    BloomMismatch,

    /// Header does not extend the current chain head.
    #[error("unknown parent: {parent} (head {head})")]
    UnknownParent {
        /// Parent hash the header names.
        parent: basalt_types::Hash,
        /// Current chain head.
        head: basalt_types::Hash,
    },

    /// State plumbing failed during block application.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Convenience alias used by the settlement entry points.
pub type VmResult<T> = Result<T, VmError>;

// =============================================================================
// TESTS
// =============================================================================
