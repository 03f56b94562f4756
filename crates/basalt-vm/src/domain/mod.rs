//! Core domain: execution entities and pure services.

pub mod entities;
pub mod services;

pub use entities::{CallResult, ExecutionContext, VmConfig};
