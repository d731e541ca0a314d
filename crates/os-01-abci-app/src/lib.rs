//! # OS-01 ABCI Application
//!
//! The consensus-side state machine of an OrderStream node.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! Validates and executes three transaction types inside Tendermint-style
//! consensus:
//! - `OrderBroadcast`: signed user orders, tagged and handed to subscribers
//! - `stake`: witnesses of external stake events, folded into balances
//! - `rebalance`: next period boundaries and per-staker quotas
//!
//! ## Transaction Pipeline
//!
//! | Step | Rejection |
//! |------|-----------|
//! | zstd + envelope decode | `Decompress` |
//! | `type` dispatch | `UnknownType` |
//! | payload parse | `Format` |
//! | poster recovery | `NoSigner` |
//! | quota / state rules | `NoQuota`, `DuplicateWitness`, `StaleRound`, `InvalidRebalance` |
//!
//! ## Module Structure
//!
//! ```text
//! os-01-abci-app/
//! ├── domain/      # CommitState, Verdict, RejectReason, QuotaPolicy
//! ├── ports/       # AbciApplication, OrderQueue, RebalancerNotifier
//! ├── adapters/    # OrderQueue for OrderTracker
//! └── service.rs   # OrderStreamApp
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{CommitState, QuotaPolicy, RejectReason, Verdict};
pub use ports::{
    AbciApplication, BlockHeader, InfoResponse, NoopNotifier, OrderQueue, RebalancerNotifier,
    RecordingNotifier,
};
pub use service::{AbciConfig, Admitted, OrderStreamApp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
