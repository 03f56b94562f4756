//! # Logs Bloom
//!
//! Fixed-size probabilistic summary of the logs emitted by a transaction or a
//! block. Three bit positions per item, derived from the Keccak-256 of the
//! item; a block's bloom is the bitwise OR of its receipts' blooms.
//!
//! INVARIANT: no false negatives. Every accrued item is reported present.

use crate::block::Log;
use crate::primitives::Hash;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Bloom width in bits.
pub const BLOOM_BITS: usize = 2048;

/// Hash-derived bit positions per accrued item.
const POSITIONS_PER_ITEM: usize = 3;

/// 2048-bit logs bloom filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsBloom {
    /// Bit array storing the filter state.
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes: Vec<u8> = bits.as_raw_slice().to_vec();
        (bytes, bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

impl LogsBloom {
    /// Creates an empty bloom.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; BLOOM_BITS],
        }
    }

    /// Accrues one item into the filter.
    ///
    /// After accrual, `contains(item)` is guaranteed to return true.
    pub fn accrue(&mut self, item: &[u8]) {
        for position in bit_positions(item) {
            self.bits.set(position, true);
        }
    }

    /// Accrues a log: its emitting address plus every topic.
    pub fn accrue_log(&mut self, log: &Log) {
        self.accrue(log.address.as_bytes());
        for topic in &log.topics {
            self.accrue(topic.as_bytes());
        }
    }

    /// Tests an item for (probabilistic) membership.
    #[must_use]
    pub fn contains(&self, item: &[u8]) -> bool {
        bit_positions(item).into_iter().all(|p| self.bits[p])
    }

    /// ORs another bloom into this one.
    pub fn union(&mut self, other: &Self) {
        for (index, bit) in other.bits.iter().enumerate() {
            if *bit {
                self.bits.set(index, true);
            }
        }
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Returns the raw filter bytes (256 bytes).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}

impl Default for LogsBloom {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the three bit positions for an item from its Keccak-256 hash:
/// consecutive byte pairs reduced modulo the filter width.
fn bit_positions(item: &[u8]) -> [usize; POSITIONS_PER_ITEM] {
    let hash: [u8; 32] = Keccak256::digest(item).into();
    let mut positions = [0usize; POSITIONS_PER_ITEM];
    for (i, position) in positions.iter_mut().enumerate() {
        let pair = ((hash[2 * i] as usize) << 8) | hash[2 * i + 1] as usize;
        *position = pair % BLOOM_BITS;
    }
    positions
}

/// Convenience: bit positions derived from a 32-byte hash value.
#[must_use]
pub fn contains_hash(bloom: &LogsBloom, hash: &Hash) -> bool {
    bloom.contains(hash.as_bytes())
}

// =============================================================================
// TESTS
// =============================================================================
