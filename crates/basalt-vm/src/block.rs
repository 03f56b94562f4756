//! # Block Processor
//!
//! Thin orchestration over the transaction processor: applies a block's
//! transactions strictly in sequence, accrues the logs bloom and fees, pays
//! miner and uncle rewards, and verifies the resulting roots against the
//! header.
//!
//! Block application is serialized end-to-end by a mutex gate: validation
//! touches the head pointer and total difficulty, which are not safe for
//! concurrent mutation.

use crate::domain::entities::VmConfig;
use crate::errors::BlockError;
use crate::ports::outbound::SignatureRecovery;
use crate::tx::TransactionProcessor;
use basalt_state::{StateCache, StateError};
use basalt_types::{keccak256, Block, BlockHeader, Hash, LogsBloom, Receipt, U256};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Static reward paid to the block's coinbase.
pub const BLOCK_REWARD: u64 = 5_000_000_000_000_000_000;

/// Oldest ancestor generation an uncle may descend from.
const MAX_UNCLE_DEPTH: u64 = 6;

// =============================================================================
// CHAIN HEAD
// =============================================================================

/// Chain metadata guarded by the block-application gate.
#[derive(Clone, Debug)]
pub struct ChainHead {
    /// Hash of the current head block.
    pub head_hash: Hash,
    /// Number of the current head block.
    pub head_number: u64,
    /// Accumulated difficulty up to the head.
    pub total_difficulty: U256,
}

// =============================================================================
// BLOCK OUTCOME
// =============================================================================

/// Everything a block's execution produced.
#[derive(Clone, Debug)]
pub struct BlockOutcome {
    /// Per-transaction receipts in application order.
    pub receipts: Vec<Receipt>,
    /// OR of every receipt's bloom.
    pub logs_bloom: LogsBloom,
    /// Total gas consumed by the block's transactions.
    pub gas_used: u64,
    /// World-state root after execution, rewards, and flush.
    pub state_root: Hash,
    /// Commitment over the receipts.
    pub receipts_root: Hash,
}

// =============================================================================
// BLOCK PROCESSOR
// =============================================================================

/// Applies blocks to the chain, one at a time.
pub struct BlockProcessor {
    config: VmConfig,
    chain: Mutex<ChainHead>,
}

impl BlockProcessor {
    /// Creates a processor whose chain starts at the given head.
    #[must_use]
    pub fn new(config: VmConfig, head: ChainHead) -> Self {
        Self {
            config,
            chain: Mutex::new(head),
        }
    }

    /// Current chain head.
    #[must_use]
    pub fn head(&self) -> ChainHead {
        self.chain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates and applies a sealed block.
    ///
    /// On success the durable store's checkpoint commits and the head
    /// advances. On any failure (a rejected transaction, or a root, receipt,
    /// or bloom mismatch) the whole block's writes revert and the cache is
    /// reset.
    pub fn apply_block(
        &self,
        cache: &mut StateCache,
        block: &Block,
        recovery: &dyn SignatureRecovery,
    ) -> Result<BlockOutcome, BlockError> {
        // One block at a time, end to end
        let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);

        if block.header.parent_hash != chain.head_hash {
            return Err(BlockError::UnknownParent {
                parent: block.header.parent_hash,
                head: chain.head_hash,
            });
        }

        cache.checkpoint_store();
        let outcome = self
            .execute_block(cache, block, recovery)
            .and_then(|outcome| verify_header(&block.header, outcome));

        match outcome {
            Ok(outcome) => {
                cache.commit_store()?;
                chain.head_hash = block.header.hash();
                chain.head_number = block.header.number;
                chain.total_difficulty =
                    chain.total_difficulty.saturating_add(block.header.difficulty);
                info!(
                    target: "block",
                    number = block.header.number,
                    gas_used = outcome.gas_used,
                    txs = outcome.receipts.len(),
                    "block applied"
                );
                Ok(outcome)
            }
            Err(error) => {
                warn!(target: "block", number = block.header.number, %error, "block rejected");
                cache.revert_store()?;
                cache.clear();
                Err(error)
            }
        }
    }

    /// Runs a block's transactions and rewards and flushes the cache,
    /// without verifying the header or touching the chain head. This is the
    /// proposal path; [`BlockProcessor::apply_block`] is the import path.
    pub fn execute_block(
        &self,
        cache: &mut StateCache,
        block: &Block,
        recovery: &dyn SignatureRecovery,
    ) -> Result<BlockOutcome, BlockError> {
        let context = block.header.context();
        let mut receipts = Vec::with_capacity(block.transactions.len());
        let mut logs_bloom = LogsBloom::new();
        let mut gas_used = 0u64;

        for (index, tx) in block.transactions.iter().enumerate() {
            let mut processor = TransactionProcessor::new(
                cache,
                context.clone(),
                self.config.clone(),
                recovery,
            );
            let receipt = processor
                .execute(tx)
                .map_err(|source| BlockError::Transaction { index, source })?;

            // The coinbase collects every transaction's fee
            cache.credit(context.coinbase, tx.gas_price * U256::from(receipt.gas_used))?;

            logs_bloom.union(&receipt.logs_bloom);
            gas_used += receipt.gas_used;
            receipts.push(receipt);
        }

        pay_rewards(cache, &block.header, &block.uncles)?;
        cache.flush()?;

        let receipts_root = receipts_root(&receipts)?;
        Ok(BlockOutcome {
            receipts,
            logs_bloom,
            gas_used,
            state_root: cache.root_hash(),
            receipts_root,
        })
    }
}

/// Pays the static block reward plus the uncle/nephew schedule.
fn pay_rewards(
    cache: &mut StateCache,
    header: &BlockHeader,
    uncles: &[BlockHeader],
) -> Result<(), StateError> {
    let base = U256::from(BLOCK_REWARD);
    let mut miner_reward = base;

    for uncle in uncles {
        let depth = header.number.saturating_sub(uncle.number);
        if (1..=MAX_UNCLE_DEPTH).contains(&depth) {
            // Uncle coinbase: reward × (8 − depth) / 8
            let uncle_reward = base * U256::from(8 - depth) / U256::from(8u64);
            cache.credit(uncle.coinbase, uncle_reward)?;
        }
        // Nephew bonus for including it
        miner_reward += base / U256::from(32u64);
    }

    cache.credit(header.coinbase, miner_reward)
}

/// Deterministic commitment over the receipt list.
fn receipts_root(receipts: &[Receipt]) -> Result<Hash, BlockError> {
    let encoded = bincode::serialize(receipts)
        .map_err(|e| BlockError::State(StateError::Codec(e.to_string())))?;
    Ok(keccak256(&encoded))
}

/// Checks the three header commitments; mismatch on any is fatal.
fn verify_header(header: &BlockHeader, outcome: BlockOutcome) -> Result<BlockOutcome, BlockError> {
    if outcome.state_root != header.state_root {
        return Err(BlockError::StateRootMismatch {
            expected: header.state_root,
            computed: outcome.state_root,
        });
    }
    if outcome.receipts_root != header.receipts_root {
        return Err(BlockError::ReceiptsRootMismatch {
            expected: header.receipts_root,
            computed: outcome.receipts_root,
        });
    }
    if outcome.logs_bloom != header.logs_bloom {
        return Err(BlockError::BloomMismatch);
    }
    Ok(outcome)
}

// =============================================================================
// TESTS
// =============================================================================
