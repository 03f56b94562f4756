//! Adapters implementing the outbound ports.

pub mod recovery;

pub use recovery::K256Recovery;
