//! # OrderStream Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bridge_flow.rs   # rebalancer → consensus → rebalancer
//!     └── order_flow.rs    # signed order → ABCI → subscribers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p os-tests
//! cargo test -p os-tests integration::bridge_flow
//! ```

pub mod integration;
