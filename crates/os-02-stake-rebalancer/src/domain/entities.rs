//! Rebalancer domain entities.

use shared_types::{Address, StakeKind, StakeWitness, U256};

use super::errors::RebalancerError;

/// Raw staking contract log as read from the external chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeLog {
    /// Event name (`StakeMade` / `StakeRemoved`).
    pub event: String,
    /// Staker address.
    pub staker: Address,
    /// Amount staked or unstaked.
    pub amount: U256,
    /// Block the log was mined in.
    pub block: u64,
}

/// A normalized stake event. Keyed by the block it occurred in, not the
/// block at which it matures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeEvent {
    /// Staker address.
    pub staker: Address,
    /// Add or remove.
    pub kind: StakeKind,
    /// Amount.
    pub amount: U256,
    /// External block of the event.
    pub block: u64,
}

impl StakeEvent {
    /// Normalize a contract log.
    pub fn from_log(log: &StakeLog) -> Result<Self, RebalancerError> {
        let kind = match log.event.to_ascii_lowercase().as_str() {
            "stakemade" => StakeKind::Add,
            "stakeremoved" => StakeKind::Remove,
            _ => return Err(RebalancerError::UnknownEvent(log.event.clone())),
        };
        Ok(Self {
            staker: log.staker,
            kind,
            amount: log.amount,
            block: log.block,
        })
    }

    /// Witness transaction payload for this event.
    pub fn to_witness(&self, nonce: u32) -> StakeWitness {
        StakeWitness {
            staker: self.staker,
            kind: self.kind,
            block: self.block,
            amount: self.amount,
            nonce,
        }
    }
}

/// Rebalancer lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Configuration validated, chain not contacted yet.
    Constructed,
    /// Chain reachable and contract bound.
    Initialized,
    /// Subscribed to events.
    Started,
}
