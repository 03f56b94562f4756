//! # Transaction Processor
//!
//! Validates a transaction against sender state, runs it through the call
//! dispatcher, and settles gas fees and refunds.
//!
//! Validation order: signature, nonce, intrinsic cost, upfront balance. Any
//! failure aborts before the first state mutation, so there is nothing to
//! roll back.

use crate::dispatch::{CallDispatcher, CallMessage, CreateMessage};
use crate::domain::entities::VmConfig;
use crate::domain::services::intrinsic_gas;
use crate::errors::TxError;
use crate::evm::gas::capped_refund;
use crate::ports::outbound::SignatureRecovery;
use basalt_state::StateCache;
use basalt_types::{BlockContext, Receipt, Transaction, U256};
use tracing::{debug, info};

/// Applies one transaction to the cache.
pub struct TransactionProcessor<'a> {
    cache: &'a mut StateCache,
    block: BlockContext,
    config: VmConfig,
    recovery: &'a dyn SignatureRecovery,
}

impl<'a> TransactionProcessor<'a> {
    /// Creates a processor bound to one block's context.
    pub fn new(
        cache: &'a mut StateCache,
        block: BlockContext,
        config: VmConfig,
        recovery: &'a dyn SignatureRecovery,
    ) -> Self {
        Self {
            cache,
            block,
            config,
            recovery,
        }
    }

    /// Validates and executes `tx`, returning its receipt.
    ///
    /// # Errors
    ///
    /// A [`TxError`] rejects the transaction with no state mutated. Fee
    /// settlement for the *coinbase* is the block processor's job.
    pub fn execute(&mut self, tx: &Transaction) -> Result<Receipt, TxError> {
        // (1) A valid recoverable signature exists; recovery runs once
        let sender = match tx.cached_sender() {
            Some(sender) => sender,
            None => {
                let sender = self
                    .recovery
                    .recover_address(&tx.signing_hash(), &tx.signature)
                    .ok_or(TxError::InvalidSignature)?;
                tx.cache_sender(sender);
                sender
            }
        };

        // (2) Sender's account nonce matches
        let account_nonce = self.cache.nonce(sender)?;
        if account_nonce != tx.nonce {
            return Err(TxError::NonceMismatch {
                expected: account_nonce,
                found: tx.nonce,
            });
        }

        // (3) The gas limit covers the intrinsic cost
        let intrinsic = intrinsic_gas(tx.data.as_slice());
        if tx.gas_limit < intrinsic {
            return Err(TxError::IntrinsicGasTooLow {
                required: intrinsic,
                limit: tx.gas_limit,
            });
        }

        // (4) The balance covers value + gas_price × gas_limit
        let balance = self.cache.balance(sender)?;
        let upfront = tx
            .gas_price
            .checked_mul(U256::from(tx.gas_limit))
            .and_then(|fees| fees.checked_add(tx.value))
            .ok_or(TxError::UpfrontCost {
                required: U256::MAX,
                available: balance,
            })?;
        if balance < upfront {
            return Err(TxError::UpfrontCost {
                required: upfront,
                available: balance,
            });
        }

        // Validation passed; mutation starts here
        self.cache.increment_nonce(sender)?;

        let budget = tx.gas_limit - intrinsic;
        debug!(target: "tx", sender = %sender, budget, create = tx.is_create(), "executing transaction");

        let mut dispatcher = CallDispatcher::new(
            self.cache,
            self.block.clone(),
            sender,
            tx.gas_price,
            self.config.clone(),
            self.recovery,
        );
        let result = match tx.to {
            Some(to) => dispatcher.call(CallMessage {
                caller: sender,
                target: to,
                code_address: None,
                value: tx.value,
                data: tx.data.clone(),
                gas_limit: budget,
                depth: 0,
            }),
            // The nonce was consumed above; the dispatcher derives the
            // contract address from the pre-increment value
            None => dispatcher.create(CreateMessage {
                creator: sender,
                value: tx.value,
                init_code: tx.data.clone(),
                gas_limit: budget,
                depth: 0,
                bump_nonce: false,
            }),
        };

        // Settle: refund capped at half of the total, sender pays the rest
        let total = result.gas_used + intrinsic;
        let refund = capped_refund(total, result.gas_refund);
        let gas_used = total - refund;
        self.cache
            .debit(sender, tx.gas_price * U256::from(gas_used))?;

        info!(
            target: "tx",
            sender = %sender,
            gas_used,
            success = result.is_success(),
            "transaction settled"
        );
        Ok(Receipt::new(
            result.is_success(),
            gas_used,
            result.logs,
            result.created_address,
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recovery::K256Recovery;
    use crate::domain::services::{address_from_public_key, compute_contract_address};
    use basalt_state::{BincodeCodec, InMemoryStore};
    use basalt_types::{Address, Bytes, RecoverableSignature};
    use k256::ecdsa::SigningKey;

    fn fresh_cache() -> StateCache {
        StateCache::new(Box::new(InMemoryStore::new()), Box::new(BincodeCodec))
    }

    /// Builds a signed transaction and returns it with its sender address.
    fn signed_tx(
        key: &SigningKey,
        nonce: u64,
        gas_price: u64,
        gas_limit: u64,
        to: Option<Address>,
        value: u64,
        data: &[u8],
    ) -> (Transaction, Address) {
        let unsigned = Transaction::new(
            nonce,
            U256::from(gas_price),
            gas_limit,
            to,
            U256::from(value),
            Bytes::from_slice(data),
            RecoverableSignature::new(0, [0u8; 32], [0u8; 32]),
        );
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(unsigned.signing_hash().as_bytes())
            .expect("signing cannot fail on a 32-byte prehash");
        let tx = Transaction::new(
            nonce,
            U256::from(gas_price),
            gas_limit,
            to,
            U256::from(value),
            Bytes::from_slice(data),
            RecoverableSignature::new(
                recovery_id.to_byte(),
                signature.r().to_bytes().into(),
                signature.s().to_bytes().into(),
            ),
        );

        let uncompressed = key.verifying_key().to_encoded_point(false);
        let mut key_bytes = [0u8; 64];
        key_bytes.copy_from_slice(&uncompressed.as_bytes()[1..]);
        (tx, address_from_public_key(&key_bytes))
    }

    fn run(cache: &mut StateCache, tx: &Transaction) -> Result<Receipt, TxError> {
        let recovery = K256Recovery;
        let mut processor = TransactionProcessor::new(
            cache,
            BlockContext::default(),
            VmConfig::default(),
            &recovery,
        );
        processor.execute(tx)
    }

    #[test]
    fn test_simple_transfer_settles_nonce_balance_and_fee() {
        // Sender nonce 0, balance 10^18, gas price 10^12, gas limit 10000,
        // empty recipient, value 100
        let key = SigningKey::random(&mut rand::thread_rng());
        let recipient = Address::new([9u8; 20]);
        let (tx, sender) = signed_tx(&key, 0, 1_000_000_000_000, 10_000, Some(recipient), 100, &[]);

        let mut cache = fresh_cache();
        let initial = U256::from(10u64).pow(U256::from(18));
        cache.credit(sender, initial).unwrap();

        let receipt = run(&mut cache, &tx).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.gas_used, 500); // Intrinsic only

        assert_eq!(cache.nonce(sender).unwrap(), 1);
        assert_eq!(cache.balance(recipient).unwrap(), U256::from(100));
        let fee = U256::from(receipt.gas_used) * U256::from(1_000_000_000_000u64);
        assert_eq!(
            cache.balance(sender).unwrap(),
            initial - U256::from(100) - fee
        );
    }

    #[test]
    fn test_wrong_nonce_rejected_without_mutation() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let (tx, sender) = signed_tx(&key, 5, 1, 30_000, Some(Address::new([9u8; 20])), 0, &[]);

        let mut cache = fresh_cache();
        cache.credit(sender, U256::from(1_000_000u64)).unwrap();

        let err = run(&mut cache, &tx).unwrap_err();
        assert!(matches!(
            err,
            TxError::NonceMismatch {
                expected: 0,
                found: 5
            }
        ));
        assert_eq!(cache.nonce(sender).unwrap(), 0);
        assert_eq!(cache.balance(sender).unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn test_gas_limit_below_intrinsic_rejected() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let (tx, sender) = signed_tx(&key, 0, 1, 499, Some(Address::new([9u8; 20])), 0, &[]);

        let mut cache = fresh_cache();
        cache.credit(sender, U256::from(1_000_000u64)).unwrap();

        assert!(matches!(
            run(&mut cache, &tx),
            Err(TxError::IntrinsicGasTooLow {
                required: 500,
                limit: 499
            })
        ));
    }

    #[test]
    fn test_insufficient_upfront_balance_rejected() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let (tx, sender) = signed_tx(&key, 0, 10, 1_000, Some(Address::new([9u8; 20])), 50, &[]);

        let mut cache = fresh_cache();
        // Needs 50 + 10 * 1000 = 10050; give slightly less
        cache.credit(sender, U256::from(10_049u64)).unwrap();

        assert!(matches!(run(&mut cache, &tx), Err(TxError::UpfrontCost { .. })));
        assert_eq!(cache.nonce(sender).unwrap(), 0);
    }

    #[test]
    fn test_contract_creation_deploys_code_and_bumps_nonce_once() {
        let key = SigningKey::random(&mut rand::thread_rng());
        // Init code returning 10 bytes of zeros:
        // PUSH1 0x0A PUSH1 0x00 RETURN
        let init = [0x60, 0x0A, 0x60, 0x00, 0xF3];
        let (tx, sender) = signed_tx(&key, 0, 1, 100_000, None, 0, &init);

        let mut cache = fresh_cache();
        cache.credit(sender, U256::from(10_000_000u64)).unwrap();

        let receipt = run(&mut cache, &tx).unwrap();
        assert!(receipt.success);

        let created = receipt.created_address.unwrap();
        assert_eq!(created, compute_contract_address(sender, 0));
        assert_eq!(cache.nonce(sender).unwrap(), 1); // Exactly once
        assert_eq!(cache.code(created).unwrap().len(), 10);
    }

    #[test]
    fn test_failed_call_still_charges_and_consumes_nonce() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let target = Address::new([7u8; 20]);
        let (tx, sender) = signed_tx(&key, 0, 1, 30_000, Some(target), 0, &[]);

        let mut cache = fresh_cache();
        cache.credit(sender, U256::from(10_000_000u64)).unwrap();
        // Target immediately hits an unassigned opcode
        cache.set_code(target, Bytes::from_slice(&[0xEF])).unwrap();

        let receipt = run(&mut cache, &tx).unwrap();
        assert!(!receipt.success);
        assert_eq!(cache.nonce(sender).unwrap(), 1);
        // The decode failed before any opcode fee; only the intrinsic cost
        // lands on the sender
        assert_eq!(receipt.gas_used, 500);
        assert_eq!(
            cache.balance(sender).unwrap(),
            U256::from(10_000_000u64 - 500)
        );
    }

    #[test]
    fn test_refund_capped_at_half_of_total() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let target = Address::new([7u8; 20]);
        let (tx, sender) = signed_tx(&key, 0, 1, 100_000, Some(target), 0, &[]);

        let mut cache = fresh_cache();
        cache.credit(sender, U256::from(10_000_000u64)).unwrap();
        // Store then clear a slot: earns a 15000 refund
        // PUSH1 07 PUSH1 00 SSTORE PUSH1 00 PUSH1 00 SSTORE
        cache
            .set_code(
                target,
                Bytes::from_slice(&[0x60, 0x07, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0x55]),
            )
            .unwrap();

        let receipt = run(&mut cache, &tx).unwrap();
        assert!(receipt.success);
        // Execution: 4 pushes (12) + SSTORE set (20000) + SSTORE reset (5000)
        // Total = 500 + 25012 = 25512; the 15000 refund is capped at half
        // of the total, 12756
        assert_eq!(receipt.gas_used, 25_512 - 12_756);
    }
}
