//! Ports for the stake rebalancer.

pub mod inbound;
pub mod outbound;

pub use inbound::BridgeEvent;
pub use outbound::{MockStakingChain, RecordingSubmitter, StakingChain, TxSubmitter};
