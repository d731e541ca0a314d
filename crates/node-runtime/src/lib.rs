//! # Node Runtime Library
//!
//! Configuration, wiring and background tasks of an OrderStream node. The
//! main entry point is the `main.rs` binary; everything it does is exposed
//! here for tests.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and subsystem construction
//! - `adapters/` - Bridge notifier and HTTP order ingress
//! - `runtime` - Task spawning and graceful shutdown
//!
//! ## Data Flow
//!
//! ```text
//! HTTP POST ──→ ingress ──broadcast_tx_sync──→ consensus node
//!                                                   │
//!                       ABCI callbacks ←────────────┘
//!                             │
//!                       OrderStreamApp ──commit──→ order subscribers
//!                             │
//!                   BridgeNotifier (try_send events, unbounded rounds)
//!                             │
//!                       StakeRebalancer ──stake / rebalance──→ Broadcaster
//!                                                                  │
//!                                              broadcast worker ───┘
//! ```
//!
//! The consensus transport itself is not part of this crate: it drives
//! [`container::SharedApp`] through the
//! [`AbciApplication`](os_01_abci_app::AbciApplication) trait.

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod runtime;

pub use container::{load_config, ConfigError, NodeConfig, SharedApp, SubsystemContainer};
pub use errors::{NodeError, NodeResult};
pub use runtime::NodeRuntime;
