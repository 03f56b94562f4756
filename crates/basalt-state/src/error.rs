//! State access error types.

use thiserror::Error;

/// Errors from the state cache or the durable-store boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The durable store failed an operation.
    #[error("store error: {0}")]
    Store(String),

    /// A persisted entry could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// `revert` or `commit` called with no outstanding checkpoint.
    #[error("no checkpoint to resolve")]
    NoCheckpoint,

    /// A balance mutation would have gone negative.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the operation needed.
        required: basalt_types::U256,
        /// Amount actually available.
        available: basalt_types::U256,
    },
}

impl From<basalt_types::account::BalanceUnderflow> for StateError {
    fn from(err: basalt_types::account::BalanceUnderflow) -> Self {
        Self::InsufficientBalance {
            required: err.required,
            available: err.available,
        }
    }
}
