//! Adapters implementing the outbound ports for local, deterministic use.

pub mod bincode_codec;
pub mod memory_store;

pub use bincode_codec::BincodeCodec;
pub use memory_store::InMemoryStore;
