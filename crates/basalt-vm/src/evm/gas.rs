//! # Gas Metering
//!
//! The fee schedule and the per-frame gas meter. Fixed per-opcode fees live
//! in [`BASE_GAS`]; dynamic fees (memory growth, storage transitions, copy
//! and log sizes) are charged at point of use by the interpreter.

use crate::errors::VmError;
use basalt_types::U256;

// =============================================================================
// FEE SCHEDULE
// =============================================================================

/// Gas costs for the instruction set and transaction envelope.
pub mod costs {
    /// Cheapest non-free tier (ADD, comparisons, PUSH/DUP/SWAP).
    pub const VERY_LOW: u64 = 3;
    /// MUL/DIV tier.
    pub const LOW: u64 = 5;
    /// ADDMOD/MULMOD tier.
    pub const MID: u64 = 8;
    /// JUMPI.
    pub const HIGH: u64 = 10;
    /// Environment reads (ADDRESS, CALLER, PC, ...).
    pub const BASE: u64 = 2;
    /// JUMPDEST marker.
    pub const JUMPDEST: u64 = 1;
    /// JUMP.
    pub const JUMP: u64 = 8;

    // Transaction envelope
    /// Base transaction fee.
    pub const TX_BASE: u64 = 500;
    /// Per byte of payload.
    pub const TX_DATA: u64 = 5;

    // Memory and copies
    /// Per newly touched 32-byte memory word.
    pub const MEMORY_WORD: u64 = 3;
    /// Per word copied by *COPY opcodes.
    pub const COPY_WORD: u64 = 3;

    // Storage
    /// SLOAD.
    pub const SLOAD: u64 = 50;
    /// SSTORE creating a slot (zero → non-zero).
    pub const SSTORE_SET: u64 = 20_000;
    /// SSTORE updating an existing slot.
    pub const SSTORE_RESET: u64 = 5_000;
    /// Refund for clearing a slot (non-zero → zero).
    pub const SSTORE_CLEAR_REFUND: u64 = 15_000;

    // Hashing
    /// SHA3 base.
    pub const SHA3: u64 = 30;
    /// SHA3 per input word.
    pub const SHA3_WORD: u64 = 6;

    // EXP
    /// EXP base.
    pub const EXP: u64 = 10;
    /// EXP per byte of exponent.
    pub const EXP_BYTE: u64 = 10;

    // Account access
    /// BALANCE.
    pub const BALANCE: u64 = 20;
    /// EXTCODESIZE / EXTCODECOPY base.
    pub const EXTCODE: u64 = 20;
    /// BLOCKHASH.
    pub const BLOCKHASH: u64 = 20;

    // Logs
    /// LOG base.
    pub const LOG: u64 = 375;
    /// LOG per topic.
    pub const LOG_TOPIC: u64 = 375;
    /// LOG per byte of data.
    pub const LOG_DATA: u64 = 8;

    // Calls and creation
    /// CALL / CALLCODE base.
    pub const CALL: u64 = 40;
    /// CREATE base.
    pub const CREATE: u64 = 32_000;
    /// Per byte of deployed contract code.
    pub const CREATE_DATA: u64 = 200;
}

// =============================================================================
// BASE FEE TABLE
// =============================================================================

/// Fixed per-opcode fees, indexed by opcode byte. Unassigned bytes are zero;
/// decode rejects them before this table is consulted.
#[rustfmt::skip]
pub const BASE_GAS: [u64; 256] = {
    let mut table = [0u64; 256];

    // Stop and arithmetic
    table[0x00] = 0;                    // STOP
    table[0x01] = costs::VERY_LOW;      // ADD
    table[0x02] = costs::LOW;           // MUL
    table[0x03] = costs::VERY_LOW;      // SUB
    table[0x04] = costs::LOW;           // DIV
    table[0x05] = costs::LOW;           // SDIV
    table[0x06] = costs::LOW;           // MOD
    table[0x07] = costs::LOW;           // SMOD
    table[0x08] = costs::MID;           // ADDMOD
    table[0x09] = costs::MID;           // MULMOD
    table[0x0A] = costs::EXP;           // EXP (dynamic byte fee added)
    table[0x0B] = costs::LOW;           // SIGNEXTEND

    // Comparison and bitwise
    table[0x10] = costs::VERY_LOW;      // LT
    table[0x11] = costs::VERY_LOW;      // GT
    table[0x12] = costs::VERY_LOW;      // SLT
    table[0x13] = costs::VERY_LOW;      // SGT
    table[0x14] = costs::VERY_LOW;      // EQ
    table[0x15] = costs::VERY_LOW;      // ISZERO
    table[0x16] = costs::VERY_LOW;      // AND
    table[0x17] = costs::VERY_LOW;      // OR
    table[0x18] = costs::VERY_LOW;      // XOR
    table[0x19] = costs::VERY_LOW;      // NOT
    table[0x1A] = costs::VERY_LOW;      // BYTE

    // Hashing
    table[0x20] = costs::SHA3;          // SHA3 (dynamic word fee added)

    // Environment
    table[0x30] = costs::BASE;          // ADDRESS
    table[0x31] = costs::BALANCE;       // BALANCE
    table[0x32] = costs::BASE;          // ORIGIN
    table[0x33] = costs::BASE;          // CALLER
    table[0x34] = costs::BASE;          // CALLVALUE
    table[0x35] = costs::VERY_LOW;      // CALLDATALOAD
    table[0x36] = costs::BASE;          // CALLDATASIZE
    table[0x37] = costs::VERY_LOW;      // CALLDATACOPY (dynamic copy fee added)
    table[0x38] = costs::BASE;          // CODESIZE
    table[0x39] = costs::VERY_LOW;      // CODECOPY (dynamic copy fee added)
    table[0x3A] = costs::BASE;          // GASPRICE
    table[0x3B] = costs::EXTCODE;       // EXTCODESIZE
    table[0x3C] = costs::EXTCODE;       // EXTCODECOPY (dynamic copy fee added)

    // Block information
    table[0x40] = costs::BLOCKHASH;     // BLOCKHASH
    table[0x41] = costs::BASE;          // COINBASE
    table[0x42] = costs::BASE;          // TIMESTAMP
    table[0x43] = costs::BASE;          // NUMBER
    table[0x44] = costs::BASE;          // DIFFICULTY
    table[0x45] = costs::BASE;          // GASLIMIT

    // Stack, memory, storage, control
    table[0x50] = costs::BASE;          // POP
    table[0x51] = costs::VERY_LOW;      // MLOAD
    table[0x52] = costs::VERY_LOW;      // MSTORE
    table[0x53] = costs::VERY_LOW;      // MSTORE8
    table[0x54] = costs::SLOAD;         // SLOAD
    table[0x55] = 0;                    // SSTORE (fully dynamic)
    table[0x56] = costs::JUMP;          // JUMP
    table[0x57] = costs::HIGH;          // JUMPI
    table[0x58] = costs::BASE;          // PC
    table[0x59] = costs::BASE;          // MSIZE
    table[0x5A] = costs::BASE;          // GAS
    table[0x5B] = costs::JUMPDEST;      // JUMPDEST

    // PUSH1-PUSH32 (0x60-0x7F)
    let mut i = 0x60;
    while i <= 0x7F {
        table[i] = costs::VERY_LOW;
        i += 1;
    }

    // DUP1-DUP16 (0x80-0x8F)
    i = 0x80;
    while i <= 0x8F {
        table[i] = costs::VERY_LOW;
        i += 1;
    }

    // SWAP1-SWAP16 (0x90-0x9F)
    i = 0x90;
    while i <= 0x9F {
        table[i] = costs::VERY_LOW;
        i += 1;
    }

    // LOG0-LOG4 (dynamic topic/data fees added)
    i = 0xA0;
    while i <= 0xA4 {
        table[i] = costs::LOG;
        i += 1;
    }

    // System
    table[0xF0] = costs::CREATE;        // CREATE
    table[0xF1] = costs::CALL;          // CALL
    table[0xF2] = costs::CALL;          // CALLCODE
    table[0xF3] = 0;                    // RETURN
    table[0xFF] = 0;                    // SELFDESTRUCT

    table
};

// =============================================================================
// GAS METER
// =============================================================================

/// Signed-safe "gas remaining" counter for one frame.
///
/// ## Invariants
/// - `used <= limit` at all times.
/// - A charge that would break the invariant fails with `OutOfGas` and leaves
///   the counter untouched; the frame then reports the *full* limit as
///   consumed (all gas is forfeit on OOG).
#[derive(Clone, Copy, Debug)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    /// Creates a meter seeded from the caller-supplied limit.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// The frame's gas limit.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas consumed so far.
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.used
    }

    /// Gas still available.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Subtracts a fee.
    ///
    /// # Errors
    ///
    /// `OutOfGas` if the fee exceeds what remains.
    pub fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        if amount > self.remaining() {
            return Err(VmError::OutOfGas);
        }
        self.used += amount;
        Ok(())
    }

    /// Returns gas a sub-call left unconsumed.
    pub fn credit(&mut self, amount: u64) {
        self.used = self.used.saturating_sub(amount);
    }
}

// =============================================================================
// DYNAMIC FEES
// =============================================================================

/// Extra EXP fee: per byte of the exponent's minimal big-endian form.
#[must_use]
pub fn exp_byte_gas(exponent: U256) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let byte_size = (256 - u64::from(exponent.leading_zeros())).div_ceil(8);
    costs::EXP_BYTE * byte_size
}

/// Extra SHA3 fee: per word of hashed input.
#[must_use]
pub fn sha3_word_gas(size: usize) -> u64 {
    costs::SHA3_WORD * size.div_ceil(32) as u64
}

/// Copy fee for the *COPY opcodes: per word moved.
#[must_use]
pub fn copy_gas(size: usize) -> u64 {
    costs::COPY_WORD * size.div_ceil(32) as u64
}

/// Extra LOG fee: per topic and per byte of data.
#[must_use]
pub fn log_gas(size: usize, topics: usize) -> u64 {
    costs::LOG_TOPIC * topics as u64 + costs::LOG_DATA * size as u64
}

/// Caps a refund at half of the gas actually used.
#[must_use]
pub fn capped_refund(gas_used: u64, refund: u64) -> u64 {
    refund.min(gas_used / 2)
}

// =============================================================================
// TESTS
// =============================================================================
