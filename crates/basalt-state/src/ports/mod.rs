//! Outbound ports: the interfaces this crate consumes from collaborators.

pub mod codec;
pub mod store;

pub use codec::AccountCodec;
pub use store::DurableStore;
