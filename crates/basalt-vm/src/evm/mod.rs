//! # Bytecode Engine
//!
//! The interpreter and its supporting machinery.
//!
//! ## Components
//!
//! - `interpreter.rs` - Fetch/decode/execute state machine
//! - `opcodes.rs` - Instruction set and per-opcode metadata
//! - `gas.rs` - Fee schedule and the gas meter
//! - `memory.rs` - Byte-addressable, grow-only memory
//! - `stack.rs` - 256-bit word stack
//! - `precompiles/` - Built-in contracts at reserved addresses

pub mod gas;
pub mod interpreter;
pub mod memory;
pub mod opcodes;
pub mod precompiles;
pub mod stack;

pub use gas::GasMeter;
pub use interpreter::{Interpreter, MachineState};
pub use memory::Memory;
pub use opcodes::Opcode;
pub use stack::Stack;
