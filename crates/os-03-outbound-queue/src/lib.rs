//! # OS-03 Outbound Queue
//!
//! Per-block delivery of everything the node accepted.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! - **OrderTracker**: tagged orders accepted in a block, fanned out to
//!   in-process subscribers when the block commits.
//! - **Broadcaster**: encoded bridge transactions, submitted to the consensus
//!   node's `broadcast_tx_sync` by a background worker.
//!
//! Both share [`OutboundQueue`]: acceptance order is preserved and delivery is
//! at-least-once. A failed flush never drops an item.
//!
//! ## Module Structure
//!
//! ```text
//! os-03-outbound-queue/
//! ├── domain/     # OutboundQueue, OutboundError
//! ├── ports/      # ConsensusRpc, MockConsensusRpc
//! ├── adapters/   # TendermintRpcClient
//! └── service/    # OrderTracker, Broadcaster, BroadcastWorker
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::TendermintRpcClient;
pub use domain::{OutboundError, OutboundQueue, OutboundResult};
pub use ports::{BroadcastResult, ConsensusRpc, MockConsensusRpc};
pub use service::{
    BroadcastWorker, Broadcaster, OrderTracker, DEFAULT_RETRY_INTERVAL,
    DEFAULT_SUBSCRIBER_CAPACITY,
};
