//! Shared builders for settlement scenarios.

use basalt_state::{BincodeCodec, InMemoryStore, StateCache};
use basalt_types::{Address, Bytes, RecoverableSignature, Transaction, U256};
use basalt_vm::domain::services::address_from_public_key;
use k256::ecdsa::SigningKey;

/// A cache over a fresh in-memory store with the bincode codec.
pub fn fresh_cache() -> StateCache {
    StateCache::new(Box::new(InMemoryStore::new()), Box::new(BincodeCodec))
}

/// Address with every byte set to `byte`.
pub fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

/// A keypair plus the account address it controls.
pub struct TestAccount {
    pub key: SigningKey,
    pub address: Address,
}

impl TestAccount {
    /// Generates a fresh account.
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let uncompressed = key.verifying_key().to_encoded_point(false);
        let mut key_bytes = [0u8; 64];
        key_bytes.copy_from_slice(&uncompressed.as_bytes()[1..]);
        Self {
            address: address_from_public_key(&key_bytes),
            key,
        }
    }

    /// Builds and signs a transaction from this account.
    pub fn sign_tx(
        &self,
        nonce: u64,
        gas_price: u64,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        data: &[u8],
    ) -> Transaction {
        let unsigned = Transaction::new(
            nonce,
            U256::from(gas_price),
            gas_limit,
            to,
            value,
            Bytes::from_slice(data),
            RecoverableSignature::new(0, [0u8; 32], [0u8; 32]),
        );
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(unsigned.signing_hash().as_bytes())
            .expect("signing cannot fail on a 32-byte prehash");
        Transaction::new(
            nonce,
            U256::from(gas_price),
            gas_limit,
            to,
            value,
            Bytes::from_slice(data),
            RecoverableSignature::new(
                recovery_id.to_byte(),
                signature.r().to_bytes().into(),
                signature.s().to_bytes().into(),
            ),
        )
    }
}
