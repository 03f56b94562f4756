//! # Interpreter
//!
//! Fetch-decode-execute loop over one frame's bytecode. Owns the frame's
//! stack, memory, and gas meter; reaches state and nested frames through the
//! call dispatcher.

use crate::dispatch::{CallDispatcher, CallMessage, CreateMessage};
use crate::domain::entities::ExecutionContext;
use crate::errors::VmError;
use crate::evm::gas::{self, costs, GasMeter, BASE_GAS};
use crate::evm::memory::Memory;
use crate::evm::opcodes::Opcode;
use crate::evm::stack::Stack;
use basalt_types::{keccak256, Address, Bytes, Hash, Log, StorageKey, StorageValue, U256};
use std::collections::HashSet;

/// Memory offsets past this bound cannot be paid for under any real gas
/// limit; the access is reported as OutOfGas without attempting allocation.
const MEMORY_HARD_BOUND: u64 = u32::MAX as u64;

// =============================================================================
// MACHINE STATE
// =============================================================================

/// Interpreter lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineState {
    /// Executing opcodes.
    Running,
    /// Ended normally via STOP/RETURN (or by running off the code end).
    Stopped,
    /// Failed with a frame-level error; the frame's checkpoint reverts.
    Reverted,
    /// Ended via SELFDESTRUCT; returns normally with the deletion recorded.
    SelfDestructed,
}

// =============================================================================
// INTERPRETER
// =============================================================================

/// One frame's execution engine.
pub struct Interpreter<'a> {
    /// Frame parameters.
    pub context: ExecutionContext,
    /// Bytecode under execution.
    pub code: &'a [u8],
    /// Program counter.
    pub pc: usize,
    /// Word stack.
    pub stack: Stack,
    /// Frame memory.
    pub memory: Memory,
    /// Gas meter seeded from the frame's limit.
    pub gas: GasMeter,
    /// Return data accumulated by RETURN.
    pub return_data: Bytes,
    /// Logs emitted by this frame and committed sub-frames.
    pub logs: Vec<Log>,
    /// Storage-clear refund accumulated so far.
    pub gas_refund: u64,
    /// Beneficiary of a SELFDESTRUCT, if one ran.
    pub selfdestruct: Option<Address>,
    /// Valid JUMPDEST positions (push literals excluded).
    pub jump_dests: HashSet<usize>,
    /// Lifecycle state.
    pub state: MachineState,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter at program counter 0.
    #[must_use]
    pub fn new(context: ExecutionContext, code: &'a [u8]) -> Self {
        let gas = GasMeter::new(context.gas_limit);
        let jump_dests = analyze_jump_dests(code);
        Self {
            context,
            code,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas,
            return_data: Bytes::new(),
            logs: Vec::new(),
            gas_refund: 0,
            selfdestruct: None,
            jump_dests,
            state: MachineState::Running,
        }
    }

    /// Runs to a terminal state.
    ///
    /// # Errors
    ///
    /// The frame-level error that stopped execution; the dispatcher reverts
    /// this frame's checkpoint and reports gas per the error kind.
    pub fn run(&mut self, host: &mut CallDispatcher<'_>) -> Result<(), VmError> {
        while self.state == MachineState::Running && self.pc < self.code.len() {
            if let Err(error) = self.step(host) {
                self.state = MachineState::Reverted;
                return Err(error);
            }
        }
        if self.state == MachineState::Running {
            // Ran off the code end: implicit STOP
            self.state = MachineState::Stopped;
        }
        Ok(())
    }

    /// One cycle: fetch, decode, charge the base fee, validate stack depth,
    /// execute, advance.
    fn step(&mut self, host: &mut CallDispatcher<'_>) -> Result<(), VmError> {
        let byte = self.code[self.pc];
        let opcode = Opcode::from_byte(byte).ok_or(VmError::InvalidOpcode(byte))?;

        self.gas.charge(BASE_GAS[byte as usize])?;
        self.stack.require(opcode.required_stack())?;

        self.pc += 1;
        self.execute_opcode(opcode, host)
    }

    /// Charges and performs memory growth for an access of `len` bytes at
    /// `offset`, returning the offset as usize. Zero-length accesses touch
    /// nothing.
    fn touch_memory(&mut self, offset: U256, len: U256) -> Result<usize, VmError> {
        if len.is_zero() {
            return Ok(0);
        }
        let end = offset.checked_add(len).ok_or(VmError::OutOfGas)?;
        if end > U256::from(MEMORY_HARD_BOUND) {
            return Err(VmError::OutOfGas);
        }
        let end = end.as_u64() as usize;
        let new_words = Memory::words_for(end);
        let current_words = self.memory.word_size();
        if new_words > current_words {
            let fee = costs::MEMORY_WORD * (new_words - current_words) as u64;
            self.gas.charge(fee)?;
            self.memory.expand(end);
        }
        Ok(offset.as_u64() as usize)
    }

    #[allow(clippy::too_many_lines)]
    fn execute_opcode(
        &mut self,
        opcode: Opcode,
        host: &mut CallDispatcher<'_>,
    ) -> Result<(), VmError> {
        match opcode {
            // =================================================================
            // STOP & ARITHMETIC
            // =================================================================
            Opcode::Stop => {
                self.state = MachineState::Stopped;
            }

            Opcode::Add => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_add(b).0)?;
            }

            Opcode::Mul => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_mul(b).0)?;
            }

            Opcode::Sub => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a.overflowing_sub(b).0)?;
            }

            Opcode::Div => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack
                    .push(if b.is_zero() { U256::zero() } else { a / b })?;
            }

            Opcode::SDiv => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    signed_div(a, b)
                };
                self.stack.push(result)?;
            }

            Opcode::Mod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack
                    .push(if b.is_zero() { U256::zero() } else { a % b })?;
            }

            Opcode::SMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let result = if b.is_zero() {
                    U256::zero()
                } else {
                    signed_mod(a, b)
                };
                self.stack.push(result)?;
            }

            Opcode::AddMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    // 512-bit intermediate so the sum cannot wrap
                    let sum = u256_to_u512(a) + u256_to_u512(b);
                    u512_to_u256(sum % u256_to_u512(n))
                };
                self.stack.push(result)?;
            }

            Opcode::MulMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let result = if n.is_zero() {
                    U256::zero()
                } else {
                    let product = u256_to_u512(a) * u256_to_u512(b);
                    u512_to_u256(product % u256_to_u512(n))
                };
                self.stack.push(result)?;
            }

            Opcode::Exp => {
                let base = self.stack.pop()?;
                let exponent = self.stack.pop()?;
                self.gas.charge(gas::exp_byte_gas(exponent))?;
                self.stack.push(exp_by_squaring(base, exponent))?;
            }

            Opcode::SignExtend => {
                let k = self.stack.pop()?;
                let x = self.stack.pop()?;
                let result = if k < U256::from(32) {
                    let bit_index = 8 * k.as_usize() + 7;
                    let mask = (U256::one() << (bit_index + 1)) - 1;
                    if x.bit(bit_index) {
                        x | !mask
                    } else {
                        x & mask
                    }
                } else {
                    x
                };
                self.stack.push(result)?;
            }

            // =================================================================
            // COMPARISON & BITWISE
            // =================================================================
            Opcode::Lt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a < b))?;
            }

            Opcode::Gt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a > b))?;
            }

            Opcode::SLt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(signed_lt(a, b)))?;
            }

            Opcode::SGt => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(signed_lt(b, a)))?;
            }

            Opcode::Eq => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(bool_word(a == b))?;
            }

            Opcode::IsZero => {
                let a = self.stack.pop()?;
                self.stack.push(bool_word(a.is_zero()))?;
            }

            Opcode::And => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a & b)?;
            }

            Opcode::Or => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a | b)?;
            }

            Opcode::Xor => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a ^ b)?;
            }

            Opcode::Not => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }

            Opcode::Byte => {
                let i = self.stack.pop()?;
                let x = self.stack.pop()?;
                let result = if i < U256::from(32) {
                    let mut bytes = [0u8; 32];
                    x.to_big_endian(&mut bytes);
                    U256::from(bytes[i.as_usize()])
                } else {
                    U256::zero()
                };
                self.stack.push(result)?;
            }

            // =================================================================
            // HASHING
            // =================================================================
            Opcode::Sha3 => {
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let offset = self.touch_memory(offset, size)?;
                let size = small_len(size);
                self.gas.charge(gas::sha3_word_gas(size))?;
                let data = self.memory.read_bytes(offset, size);
                self.stack
                    .push(U256::from_big_endian(keccak256(&data).as_bytes()))?;
            }

            // =================================================================
            // ENVIRONMENTAL INFORMATION
            // =================================================================
            Opcode::Address => {
                self.stack.push(self.context.address.as_word())?;
            }

            Opcode::Balance => {
                let address = Address::from_word(self.stack.pop()?);
                let balance = host.cache.balance(address)?;
                self.stack.push(balance)?;
            }

            Opcode::Origin => {
                self.stack.push(self.context.origin.as_word())?;
            }

            Opcode::Caller => {
                self.stack.push(self.context.caller.as_word())?;
            }

            Opcode::CallValue => {
                self.stack.push(self.context.value)?;
            }

            Opcode::CallDataLoad => {
                let offset = self.stack.pop()?;
                let word = data_slice(self.context.data.as_slice(), offset, 32);
                self.stack.push(U256::from_big_endian(&word))?;
            }

            Opcode::CallDataSize => {
                self.stack.push(U256::from(self.context.data.len()))?;
            }

            Opcode::CallDataCopy => {
                let dest = self.stack.pop()?;
                let src = self.stack.pop()?;
                let size = self.stack.pop()?;
                let dest = self.touch_memory(dest, size)?;
                let size = small_len(size);
                self.gas.charge(gas::copy_gas(size))?;
                let bytes = data_slice(self.context.data.as_slice(), src, size);
                self.memory.write_bytes(dest, &bytes);
            }

            Opcode::CodeSize => {
                self.stack.push(U256::from(self.code.len()))?;
            }

            Opcode::CodeCopy => {
                let dest = self.stack.pop()?;
                let src = self.stack.pop()?;
                let size = self.stack.pop()?;
                let dest = self.touch_memory(dest, size)?;
                let size = small_len(size);
                self.gas.charge(gas::copy_gas(size))?;
                let bytes = data_slice(self.code, src, size);
                self.memory.write_bytes(dest, &bytes);
            }

            Opcode::GasPrice => {
                self.stack.push(self.context.gas_price)?;
            }

            Opcode::ExtCodeSize => {
                let address = Address::from_word(self.stack.pop()?);
                let code = host.cache.code(address)?;
                self.stack.push(U256::from(code.len()))?;
            }

            Opcode::ExtCodeCopy => {
                let address = Address::from_word(self.stack.pop()?);
                let dest = self.stack.pop()?;
                let src = self.stack.pop()?;
                let size = self.stack.pop()?;
                let dest = self.touch_memory(dest, size)?;
                let size = small_len(size);
                self.gas.charge(gas::copy_gas(size))?;
                let code = host.cache.code(address)?;
                let bytes = data_slice(code.as_slice(), src, size);
                self.memory.write_bytes(dest, &bytes);
            }

            // =================================================================
            // BLOCK INFORMATION
            // =================================================================
            Opcode::BlockHash => {
                // Header history belongs to the chain layer, not this core
                self.stack.pop()?;
                self.stack.push(U256::zero())?;
            }

            Opcode::Coinbase => {
                self.stack.push(self.context.block.coinbase.as_word())?;
            }

            Opcode::Timestamp => {
                self.stack.push(U256::from(self.context.block.timestamp))?;
            }

            Opcode::Number => {
                self.stack.push(U256::from(self.context.block.number))?;
            }

            Opcode::Difficulty => {
                self.stack.push(self.context.block.difficulty)?;
            }

            Opcode::GasLimit => {
                self.stack.push(U256::from(self.context.block.gas_limit))?;
            }

            // =================================================================
            // STACK, MEMORY, STORAGE
            // =================================================================
            Opcode::Pop => {
                self.stack.pop()?;
            }

            Opcode::MLoad => {
                let offset = self.stack.pop()?;
                let offset = self.touch_memory(offset, U256::from(32))?;
                let word = self.memory.read_word(offset);
                self.stack.push(U256::from_big_endian(&word))?;
            }

            Opcode::MStore => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let offset = self.touch_memory(offset, U256::from(32))?;
                let mut bytes = [0u8; 32];
                value.to_big_endian(&mut bytes);
                self.memory.write_word(offset, &bytes);
            }

            Opcode::MStore8 => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let offset = self.touch_memory(offset, U256::one())?;
                self.memory.write_byte(offset, value.byte(0));
            }

            Opcode::SLoad => {
                let key = StorageKey::from_u256(self.stack.pop()?);
                let value = host.cache.storage(self.context.address, key)?;
                self.stack.push(value.to_u256())?;
            }

            Opcode::SStore => {
                let key = StorageKey::from_u256(self.stack.pop()?);
                let value = StorageValue::from_u256(self.stack.pop()?);
                let previous = host.cache.storage(self.context.address, key)?;

                // Creating a slot costs extra; clearing one earns a refund
                if previous.is_zero() && !value.is_zero() {
                    self.gas.charge(costs::SSTORE_SET)?;
                } else {
                    self.gas.charge(costs::SSTORE_RESET)?;
                }
                if !previous.is_zero() && value.is_zero() {
                    self.gas_refund += costs::SSTORE_CLEAR_REFUND;
                }

                host.cache.set_storage(self.context.address, key, value)?;
            }

            Opcode::Jump => {
                let dest = self.stack.pop()?;
                self.pc = self.valid_jump(dest)?;
            }

            Opcode::JumpI => {
                let dest = self.stack.pop()?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    self.pc = self.valid_jump(dest)?;
                }
            }

            Opcode::Pc => {
                self.stack.push(U256::from(self.pc - 1))?;
            }

            Opcode::MSize => {
                self.stack.push(U256::from(self.memory.len()))?;
            }

            Opcode::Gas => {
                self.stack.push(U256::from(self.gas.remaining()))?;
            }

            Opcode::JumpDest => {
                // Marker only
            }

            // =================================================================
            // PUSH / DUP / SWAP
            // =================================================================
            Opcode::Push1
            | Opcode::Push2
            | Opcode::Push3
            | Opcode::Push4
            | Opcode::Push5
            | Opcode::Push6
            | Opcode::Push7
            | Opcode::Push8
            | Opcode::Push9
            | Opcode::Push10
            | Opcode::Push11
            | Opcode::Push12
            | Opcode::Push13
            | Opcode::Push14
            | Opcode::Push15
            | Opcode::Push16
            | Opcode::Push17
            | Opcode::Push18
            | Opcode::Push19
            | Opcode::Push20
            | Opcode::Push21
            | Opcode::Push22
            | Opcode::Push23
            | Opcode::Push24
            | Opcode::Push25
            | Opcode::Push26
            | Opcode::Push27
            | Opcode::Push28
            | Opcode::Push29
            | Opcode::Push30
            | Opcode::Push31
            | Opcode::Push32 => {
                let size = opcode.push_size().unwrap_or(0);
                let mut bytes = [0u8; 32];
                let end = (self.pc + size).min(self.code.len());
                let available = end - self.pc;
                // A literal truncated by the code end is zero-filled low
                bytes[32 - size..32 - size + available]
                    .copy_from_slice(&self.code[self.pc..end]);
                self.stack.push(U256::from_big_endian(&bytes))?;
                self.pc += size;
            }

            Opcode::Dup1
            | Opcode::Dup2
            | Opcode::Dup3
            | Opcode::Dup4
            | Opcode::Dup5
            | Opcode::Dup6
            | Opcode::Dup7
            | Opcode::Dup8
            | Opcode::Dup9
            | Opcode::Dup10
            | Opcode::Dup11
            | Opcode::Dup12
            | Opcode::Dup13
            | Opcode::Dup14
            | Opcode::Dup15
            | Opcode::Dup16 => {
                self.stack.dup((opcode as u8 - 0x80) as usize)?;
            }

            Opcode::Swap1
            | Opcode::Swap2
            | Opcode::Swap3
            | Opcode::Swap4
            | Opcode::Swap5
            | Opcode::Swap6
            | Opcode::Swap7
            | Opcode::Swap8
            | Opcode::Swap9
            | Opcode::Swap10
            | Opcode::Swap11
            | Opcode::Swap12
            | Opcode::Swap13
            | Opcode::Swap14
            | Opcode::Swap15
            | Opcode::Swap16 => {
                self.stack.swap((opcode as u8 - 0x90 + 1) as usize)?;
            }

            // =================================================================
            // LOGGING
            // =================================================================
            Opcode::Log0 | Opcode::Log1 | Opcode::Log2 | Opcode::Log3 | Opcode::Log4 => {
                let topic_count = (opcode as u8 - 0xA0) as usize;
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;

                let mut topics = Vec::with_capacity(topic_count);
                for _ in 0..topic_count {
                    let topic = self.stack.pop()?;
                    let mut bytes = [0u8; 32];
                    topic.to_big_endian(&mut bytes);
                    topics.push(Hash::new(bytes));
                }

                let offset = self.touch_memory(offset, size)?;
                let size = small_len(size);
                self.gas.charge(gas::log_gas(size, topic_count))?;

                let data = self.memory.read_bytes(offset, size);
                self.logs.push(Log::new(
                    self.context.address,
                    topics,
                    Bytes::from_vec(data),
                ));
            }

            // =================================================================
            // SYSTEM
            // =================================================================
            Opcode::Create => {
                let value = self.stack.pop()?;
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let offset = self.touch_memory(offset, size)?;
                let size = small_len(size);
                let init_code = Bytes::from_vec(self.memory.read_bytes(offset, size));

                // The new frame receives everything this one has left
                let forwarded = self.gas.remaining();
                self.gas.charge(forwarded)?;
                let result = host.create(CreateMessage {
                    creator: self.context.address,
                    value,
                    init_code,
                    gas_limit: forwarded,
                    depth: self.context.depth + 1,
                    bump_nonce: true,
                });
                self.gas.credit(forwarded.saturating_sub(result.gas_used));

                if result.is_success() {
                    self.logs.extend(result.logs);
                    self.gas_refund += result.gas_refund;
                    let created = result
                        .created_address
                        .map_or_else(U256::zero, |a| a.as_word());
                    self.stack.push(created)?;
                } else {
                    self.stack.push(U256::zero())?;
                }
            }

            Opcode::Call | Opcode::CallCode => {
                let gas_word = self.stack.pop()?;
                let to = Address::from_word(self.stack.pop()?);
                let value = self.stack.pop()?;
                let in_offset = self.stack.pop()?;
                let in_size = self.stack.pop()?;
                let out_offset = self.stack.pop()?;
                let out_size = self.stack.pop()?;

                let in_offset = self.touch_memory(in_offset, in_size)?;
                let in_size = small_len(in_size);
                let out_offset = self.touch_memory(out_offset, out_size)?;
                let out_size = small_len(out_size);

                let forwarded = gas_word.min(U256::from(u64::MAX)).as_u64();
                self.gas.charge(forwarded)?;

                let data = Bytes::from_vec(self.memory.read_bytes(in_offset, in_size));
                let (target, code_address) = if opcode == Opcode::CallCode {
                    // Foreign code against this frame's own account
                    (self.context.address, Some(to))
                } else {
                    (to, None)
                };
                let result = host.call(CallMessage {
                    caller: self.context.address,
                    target,
                    code_address,
                    value,
                    data,
                    gas_limit: forwarded,
                    depth: self.context.depth + 1,
                });
                self.gas.credit(forwarded.saturating_sub(result.gas_used));

                if result.is_success() {
                    self.logs.extend(result.logs);
                    self.gas_refund += result.gas_refund;
                    let n = out_size.min(result.return_data.len());
                    self.memory
                        .write_bytes(out_offset, &result.return_data.as_slice()[..n]);
                    self.stack.push(U256::one())?;
                } else {
                    self.stack.push(U256::zero())?;
                }
            }

            Opcode::Return => {
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let offset = self.touch_memory(offset, size)?;
                let size = small_len(size);
                self.return_data = Bytes::from_vec(self.memory.read_bytes(offset, size));
                self.state = MachineState::Stopped;
            }

            Opcode::SelfDestruct => {
                let beneficiary = Address::from_word(self.stack.pop()?);
                host.cache
                    .delete_account(self.context.address, beneficiary)?;
                self.selfdestruct = Some(beneficiary);
                self.state = MachineState::SelfDestructed;
            }
        }

        Ok(())
    }

    /// Validates a jump target against the JUMPDEST markers.
    fn valid_jump(&self, dest: U256) -> Result<usize, VmError> {
        if dest > U256::from(self.code.len()) {
            return Err(VmError::InvalidJumpDestination(self.code.len()));
        }
        let dest = dest.as_u64() as usize;
        if !self.jump_dests.contains(&dest) {
            return Err(VmError::InvalidJumpDestination(dest));
        }
        Ok(dest)
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Finds valid JUMPDEST positions, skipping push literals.
fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if op == 0x5B {
            dests.insert(i);
        }
        if (0x60..=0x7F).contains(&op) {
            i += (op - 0x5F) as usize;
        }
        i += 1;
    }
    dests
}

/// 1 for true, 0 for false.
fn bool_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Narrows a size word the memory charge has already bounded.
fn small_len(size: U256) -> usize {
    if size.is_zero() {
        0
    } else {
        size.as_u64() as usize
    }
}

/// Reads `size` bytes at `offset` from an external byte source, zero-padded
/// past its end. Never grows anything.
fn data_slice(data: &[u8], offset: U256, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let start = offset.min(U256::from(data.len())).as_u64() as usize;
    if start < data.len() {
        let n = (data.len() - start).min(size);
        out[..n].copy_from_slice(&data[start..start + n]);
    }
    out
}

/// Signed less-than over two's-complement words.
fn signed_lt(a: U256, b: U256) -> bool {
    match (a.bit(255), b.bit(255)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Signed division with truncation toward zero.
fn signed_div(a: U256, b: U256) -> U256 {
    let a_neg = a.bit(255);
    let b_neg = b.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b_neg { twos_complement(b) } else { b };
    let quotient = a_abs / b_abs;
    if a_neg == b_neg {
        quotient
    } else {
        twos_complement(quotient)
    }
}

/// Signed modulo; the result takes the dividend's sign.
fn signed_mod(a: U256, b: U256) -> U256 {
    let a_neg = a.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b.bit(255) { twos_complement(b) } else { b };
    let remainder = a_abs % b_abs;
    if a_neg {
        twos_complement(remainder)
    } else {
        remainder
    }
}

/// Exponentiation by squaring, wrapping modulo 2^256.
fn exp_by_squaring(mut base: U256, mut exponent: U256) -> U256 {
    let mut result = U256::one();
    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        exponent >>= 1;
        base = base.overflowing_mul(base).0;
    }
    result
}

fn u256_to_u512(value: U256) -> primitive_types::U512 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes[32..]);
    primitive_types::U512::from_big_endian(&bytes)
}

fn u512_to_u256(value: primitive_types::U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

// =============================================================================
// TESTS
// =============================================================================
