//! # Call Dispatcher
//!
//! Builds and runs call frames for CALL/CALLCODE/CREATE, including the
//! outermost frame of a transaction.
//!
//! ## Frame protocol
//!
//! Every nested invocation begins by taking a state-cache checkpoint. On
//! success the checkpoint is committed, making the callee's mutations visible
//! to the caller's own pending checkpoint. On any frame error the checkpoint
//! is reverted; gas already charged for the attempt stays spent.
//!
//! Two deliberate success-with-no-effect outcomes exist: CALL and CREATE with
//! a transfer value above the caller's balance do nothing and report success.

use crate::domain::entities::{CallResult, ExecutionContext, VmConfig};
use crate::domain::services::compute_contract_address;
use crate::errors::{PrecompileError, VmError};
use crate::evm::gas::costs;
use crate::evm::interpreter::Interpreter;
use crate::evm::precompiles;
use crate::ports::outbound::SignatureRecovery;
use basalt_state::StateCache;
use basalt_types::{Address, BlockContext, Bytes, U256};
use tracing::debug;

// =============================================================================
// MESSAGES
// =============================================================================

/// Parameters of a CALL/CALLCODE frame.
#[derive(Clone, Debug)]
pub struct CallMessage {
    /// Account paying the value and receiving leftover gas.
    pub caller: Address,
    /// Account executed against (and value recipient).
    pub target: Address,
    /// CALLCODE: run this account's code against `target`'s own storage.
    pub code_address: Option<Address>,
    /// Value moved from caller to target.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas forwarded into the frame.
    pub gas_limit: u64,
    /// Frame depth (0 for the outermost transaction frame).
    pub depth: u16,
}

/// Parameters of a CREATE frame.
#[derive(Clone, Debug)]
pub struct CreateMessage {
    /// Account performing the creation.
    pub creator: Address,
    /// Endowment moved into the new account.
    pub value: U256,
    /// Initialization code; its return value becomes the deployed code.
    pub init_code: Bytes,
    /// Gas forwarded into the frame.
    pub gas_limit: u64,
    /// Frame depth.
    pub depth: u16,
    /// False when the transaction layer already consumed the creator's nonce
    /// for this creation.
    pub bump_nonce: bool,
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Constructs execution contexts, enforces the depth limit, and propagates or
/// absorbs sub-frame failure. One dispatcher lives for one transaction.
pub struct CallDispatcher<'a> {
    /// The only mutable view of accounts during execution.
    pub cache: &'a mut StateCache,
    block: BlockContext,
    origin: Address,
    gas_price: U256,
    config: VmConfig,
    recovery: &'a dyn SignatureRecovery,
}

impl<'a> CallDispatcher<'a> {
    /// Creates a dispatcher for one transaction.
    pub fn new(
        cache: &'a mut StateCache,
        block: BlockContext,
        origin: Address,
        gas_price: U256,
        config: VmConfig,
        recovery: &'a dyn SignatureRecovery,
    ) -> Self {
        Self {
            cache,
            block,
            origin,
            gas_price,
            config,
            recovery,
        }
    }

    /// Runs a CALL/CALLCODE frame to completion.
    pub fn call(&mut self, msg: CallMessage) -> CallResult {
        if msg.depth > self.config.max_call_depth {
            return CallResult::failure(
                VmError::CallDepthExceeded {
                    depth: msg.depth,
                    max: self.config.max_call_depth,
                },
                0,
            );
        }

        self.cache.checkpoint();

        let caller_balance = match self.cache.balance(msg.caller) {
            Ok(balance) => balance,
            Err(e) => return self.fail(e.into(), 0),
        };
        if caller_balance < msg.value {
            // Deliberate no-op: success, zero effect, no gas lost
            debug!(target: "vm", caller = %msg.caller, "call value exceeds balance, skipping");
            return self.absorb(CallResult::success(Bytes::new(), 0));
        }
        if let Err(e) = self.cache.transfer(msg.caller, msg.target, msg.value) {
            return self.fail(e.into(), 0);
        }

        // Precompiles short-circuit before any code lookup
        let code_address = msg.code_address.unwrap_or(msg.target);
        if let Some(outcome) =
            precompiles::dispatch(code_address, msg.data.as_slice(), msg.gas_limit, self.recovery)
        {
            return match outcome {
                Ok(output) => {
                    self.absorb(CallResult::success(output.output, output.gas_used))
                }
                // Same OutOfGas shape as bytecode execution
                Err(PrecompileError::OutOfGas) => self.fail(VmError::OutOfGas, msg.gas_limit),
            };
        }

        let code = match self.cache.code(code_address) {
            Ok(code) => code,
            Err(e) => return self.fail(e.into(), 0),
        };
        if code.is_empty() {
            return self.absorb(CallResult::success(Bytes::new(), 0));
        }

        let context = ExecutionContext {
            origin: self.origin,
            caller: msg.caller,
            address: msg.target,
            value: msg.value,
            data: msg.data,
            gas_limit: msg.gas_limit,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: msg.depth,
        };
        let result = self.execute_frame(context, code.as_slice());
        self.absorb(result)
    }

    /// Runs a CREATE frame to completion.
    pub fn create(&mut self, msg: CreateMessage) -> CallResult {
        if msg.depth > self.config.max_call_depth {
            return CallResult::failure(
                VmError::CallDepthExceeded {
                    depth: msg.depth,
                    max: self.config.max_call_depth,
                },
                0,
            );
        }

        self.cache.checkpoint();

        let creator_balance = match self.cache.balance(msg.creator) {
            Ok(balance) => balance,
            Err(e) => return self.fail(e.into(), 0),
        };
        if creator_balance < msg.value {
            // Deliberate no-op: no exception, no nonce bump, value not moved
            debug!(target: "vm", creator = %msg.creator, "create endowment exceeds balance, skipping");
            return self.absorb(CallResult::success(Bytes::new(), 0));
        }

        let nonce = match self.cache.nonce(msg.creator) {
            Ok(nonce) => nonce,
            Err(e) => return self.fail(e.into(), 0),
        };
        if msg.bump_nonce {
            if let Err(e) = self.cache.increment_nonce(msg.creator) {
                return self.fail(e.into(), 0);
            }
        }
        // The child address derives from the creator's nonce before this
        // creation consumed it; the transaction layer bumps ahead of us.
        let address_nonce = if msg.bump_nonce { nonce } else { nonce.saturating_sub(1) };
        let new_address = compute_contract_address(msg.creator, address_nonce);

        if let Err(e) = self.cache.transfer(msg.creator, new_address, msg.value) {
            return self.fail(e.into(), 0);
        }

        debug!(target: "vm", creator = %msg.creator, address = %new_address, depth = msg.depth, "create frame");

        let context = ExecutionContext {
            origin: self.origin,
            caller: msg.creator,
            address: new_address,
            value: msg.value,
            data: Bytes::new(),
            gas_limit: msg.gas_limit,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: msg.depth,
        };
        let mut result = self.execute_frame(context, msg.init_code.as_slice());

        if result.is_success() {
            // The returned bytes become the deployed code, charged per byte
            // from remaining gas; unaffordable code is discarded while the
            // account itself survives with empty code.
            let deposit = std::mem::take(&mut result.return_data);
            let deposit_fee = costs::CREATE_DATA * deposit.len() as u64;
            if msg.gas_limit - result.gas_used >= deposit_fee {
                result.gas_used += deposit_fee;
                if let Err(e) = self.cache.set_code(new_address, deposit) {
                    return self.fail(e.into(), result.gas_used);
                }
            }
            result.created_address = Some(new_address);
        }
        self.absorb(result)
    }

    /// Runs the interpreter over one frame. Checkpoint resolution is the
    /// caller's responsibility.
    fn execute_frame(&mut self, context: ExecutionContext, code: &[u8]) -> CallResult {
        let mut interpreter = Interpreter::new(context, code);
        match interpreter.run(self) {
            Ok(()) => CallResult {
                gas_used: interpreter.gas.used(),
                gas_refund: interpreter.gas_refund,
                error: None,
                return_data: std::mem::take(&mut interpreter.return_data),
                logs: std::mem::take(&mut interpreter.logs),
                selfdestruct: interpreter.selfdestruct,
                created_address: None,
            },
            Err(error) => {
                let gas_used = if error.consumes_all_gas() {
                    interpreter.gas.limit()
                } else {
                    interpreter.gas.used()
                };
                debug!(target: "vm", %error, gas_used, "frame failed");
                CallResult::failure(error, gas_used)
            }
        }
    }

    /// Resolves the frame checkpoint from the result: commit on success,
    /// revert on failure.
    fn absorb(&mut self, result: CallResult) -> CallResult {
        let outcome = if result.is_success() {
            self.cache.commit()
        } else {
            self.cache.revert()
        };
        if let Err(e) = outcome {
            return CallResult::failure(e.into(), result.gas_used);
        }
        result
    }

    /// Reverts the frame checkpoint and reports the error.
    fn fail(&mut self, error: VmError, gas_used: u64) -> CallResult {
        let _ = self.cache.revert();
        CallResult::failure(error, gas_used)
    }
}

// =============================================================================
// TESTS
// =============================================================================
