//! Ports for the outbound queue.

pub mod outbound;

pub use outbound::{BroadcastResult, ConsensusRpc, MockConsensusRpc};
