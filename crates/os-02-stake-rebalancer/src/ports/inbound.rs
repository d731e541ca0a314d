//! Driving port: events the rebalancer consumes.
//!
//! Accepted rounds arrive on a separate unbounded channel, see
//! [`StakeRebalancer::run`].
//!
//! [`StakeRebalancer::run`]: crate::StakeRebalancer::run

use crate::domain::StakeLog;

/// External chain and order-stream events, delivered over one bounded
/// channel so a single task owns all rebalancer state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Staking contract log.
    StakeLog(StakeLog),
    /// New external chain head.
    NewBlock(u64),
    /// Order-stream block started (from `begin_block`).
    OrderStreamBlock {
        /// Order-stream height.
        height: u64,
        /// Proposer address.
        proposer: Vec<u8>,
    },
}
