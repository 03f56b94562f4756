//! # Basalt Test Suite
//!
//! Unified test crate for cross-crate settlement scenarios:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # Signed-transaction and cache builders
//!     ├── execution.rs    # Interpreter + dispatcher properties
//!     └── settlement.rs   # Transaction and block scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p basalt-tests
//! ```

#![allow(dead_code)]

pub mod integration;
