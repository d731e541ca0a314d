//! # Adapter Implementations
//!
//! Glue between subsystems that do not know about each other:
//!
//! ```text
//! HTTP POST ──→ ingress ──→ ConsensusRpc (broadcast_tx_sync)
//!
//! OrderStreamApp ──RebalancerNotifier──→ BridgeNotifier ──BridgeEvent / Round──→ StakeRebalancer
//!                                              │
//!                                              └── commit ──→ Broadcaster::trigger
//! ```

pub mod ingress;
pub mod notifier;

pub use ingress::{ingress_router, IngressError};
pub use notifier::BridgeNotifier;
