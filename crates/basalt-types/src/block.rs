//! # Block Entities
//!
//! Headers, bodies, receipts, and the read-only context handed to the
//! interpreter while a block's transactions execute.

use crate::bloom::LogsBloom;
use crate::primitives::{Address, Bytes, Hash, U256};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// =============================================================================
// LOG (EVENT)
// =============================================================================

/// One log entry emitted during contract execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Contract address that emitted the log.
    pub address: Address,
    /// Indexed topics (up to 4).
    pub topics: Vec<Hash>,
    /// Non-indexed data.
    pub data: Bytes,
}

impl Log {
    /// Creates a new log.
    #[must_use]
    pub fn new(address: Address, topics: Vec<Hash>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }
}

// =============================================================================
// BLOCK CONTEXT
// =============================================================================

/// Block-level information visible to executing code.
///
/// Read-only to the interpreter; supplied by the block processor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// Miner / fee recipient address.
    pub coinbase: Address,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
    /// Block number.
    pub number: u64,
    /// Block difficulty.
    pub difficulty: U256,
    /// Block gas limit.
    pub gas_limit: u64,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            coinbase: Address::ZERO,
            timestamp: 0,
            number: 0,
            difficulty: U256::zero(),
            gas_limit: 30_000_000,
        }
    }
}

// =============================================================================
// BLOCK HEADER
// =============================================================================

/// Sealed header of one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the parent block's header.
    pub parent_hash: Hash,
    /// Miner address receiving the block reward and fees.
    pub coinbase: Address,
    /// World-state root after this block's execution.
    pub state_root: Hash,
    /// Commitment over this block's receipts.
    pub receipts_root: Hash,
    /// OR of every receipt's logs bloom.
    pub logs_bloom: LogsBloom,
    /// Block difficulty.
    pub difficulty: U256,
    /// Block number.
    pub number: u64,
    /// Gas limit for the whole block.
    pub gas_limit: u64,
    /// Gas consumed by the block's transactions.
    pub gas_used: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
}

impl BlockHeader {
    /// Keccak-256 of the canonical header encoding.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.parent_hash.as_bytes());
        hasher.update(self.coinbase.as_bytes());
        hasher.update(self.state_root.as_bytes());
        hasher.update(self.receipts_root.as_bytes());
        hasher.update(self.logs_bloom.as_bytes());
        let mut difficulty = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty);
        hasher.update(difficulty);
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        hasher.update(self.gas_used.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        Hash::new(hasher.finalize().into())
    }

    /// The execution-time view of this header.
    #[must_use]
    pub fn context(&self) -> BlockContext {
        BlockContext {
            coinbase: self.coinbase,
            timestamp: self.timestamp,
            number: self.number,
            difficulty: self.difficulty,
            gas_limit: self.gas_limit,
        }
    }
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: Hash::ZERO,
            coinbase: Address::ZERO,
            state_root: Hash::ZERO,
            receipts_root: Hash::ZERO,
            logs_bloom: LogsBloom::new(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: 0,
        }
    }
}

// =============================================================================
// BLOCK
// =============================================================================

/// A full block: header, transactions, and uncle headers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Block {
    /// Sealed header.
    pub header: BlockHeader,
    /// Transactions in application order.
    pub transactions: Vec<Transaction>,
    /// Headers of included uncles.
    pub uncles: Vec<BlockHeader>,
}

// =============================================================================
// RECEIPT
// =============================================================================

/// Outcome record of one applied transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Whether the top-level call completed without exception.
    pub success: bool,
    /// Total gas charged to the sender (intrinsic + execution − refund).
    pub gas_used: u64,
    /// Logs emitted by the surviving call frames.
    pub logs: Vec<Log>,
    /// Bloom over `logs`.
    pub logs_bloom: LogsBloom,
    /// Address of the contract deployed by this transaction, if any.
    pub created_address: Option<Address>,
}

impl Receipt {
    /// Builds a receipt, deriving the bloom from the logs.
    #[must_use]
    pub fn new(
        success: bool,
        gas_used: u64,
        logs: Vec<Log>,
        created_address: Option<Address>,
    ) -> Self {
        let mut logs_bloom = LogsBloom::new();
        for log in &logs {
            logs_bloom.accrue_log(log);
        }
        Self {
            success,
            gas_used,
            logs,
            logs_bloom,
            created_address,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
