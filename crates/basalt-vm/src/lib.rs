//! # Basalt VM - Deterministic Settlement Engine
//!
//! Bytecode execution over a versioned key-value world state under strict
//! resource metering. Every state transition (contract call, contract
//! creation, value transfer) produces byte-identical results on every node
//! that replays it.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Interpreter | `evm/interpreter.rs` | Fetch/decode/execute state machine |
//! | Gas | `evm/gas.rs` | Fee schedule and per-frame metering |
//! | Stack / Memory | `evm/stack.rs`, `evm/memory.rs` | Frame-local resources |
//! | Precompiles | `evm/precompiles/` | Built-ins at reserved addresses |
//! | Call Dispatcher | `dispatch.rs` | CALL/CALLCODE/CREATE frame protocol |
//! | Tx Processor | `tx.rs` | Validation, execution, fee settlement |
//! | Block Processor | `block.rs` | Sequential application and root checks |
//!
//! ## Execution model
//!
//! Single-threaded and synchronous: interpreter, dispatcher, and transaction
//! processor form one logical call stack per transaction, and nested frames
//! are plain recursive calls. Block application is serialized end-to-end by
//! the block processor's gate. An infinite loop is bounded only by gas.
//!
//! ## Failure isolation
//!
//! | Level | Errors | Blast radius |
//! |-------|--------|--------------|
//! | Frame | `VmError` | The failing frame's checkpoint reverts; gas stays spent |
//! | Transaction | `TxError` | Rejected before any mutation |
//! | Block | `BlockError` | The whole block's writes revert |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod block;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod evm;
pub mod ports;
pub mod tx;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{CallResult, ExecutionContext, VmConfig};

    // Domain services
    pub use crate::domain::services::{
        compute_contract_address, intrinsic_gas, keccak256,
    };

    // Errors
    pub use crate::errors::{BlockError, PrecompileError, TxError, VmError};

    // Engine components
    pub use crate::evm::{GasMeter, Interpreter, MachineState, Memory, Opcode, Stack};

    // Dispatch and settlement
    pub use crate::block::{BlockOutcome, BlockProcessor, ChainHead, BLOCK_REWARD};
    pub use crate::dispatch::{CallDispatcher, CallMessage, CreateMessage};
    pub use crate::tx::TransactionProcessor;

    // Ports and adapters
    pub use crate::adapters::K256Recovery;
    pub use crate::ports::SignatureRecovery;
}

// =============================================================================
// TESTS
// =============================================================================
