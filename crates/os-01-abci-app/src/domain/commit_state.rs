//! # Commit State
//!
//! The replicated state every OrderStream node agrees on after each block.
//! It changes only inside `deliver_tx` and `commit` and is hashed at every
//! commit; all maps are ordered so that the hash is deterministic.

use serde::Serialize;
use shared_types::{
    apply_stake_change, Address, BalanceChange, BalanceMapping, Hash, Limit, LimitMapping,
    RebalanceProposal, Round, StakeWitness, StateHasher,
};
use std::collections::{BTreeMap, BTreeSet};

const STATE_HASH_DOMAIN: &str = "orderstream.commit-state.v1";

/// Post-commit state of the node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitState {
    /// Current staking period.
    pub round: Round,
    /// Stake events already applied, by external block.
    pub witnessed: BTreeMap<u64, BTreeSet<Address>>,
    /// Staked amount per staker.
    pub balances: BalanceMapping,
    /// Quotas for the current period.
    pub limits: LimitMapping,
    /// Orders accepted since genesis.
    pub order_counter: u64,
    /// Height of the last committed block.
    pub last_block_height: u64,
    /// App hash returned by the last commit.
    pub last_block_app_hash: Option<Hash>,
}

impl CommitState {
    /// Genesis state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stake event for `staker` at `block` was already applied.
    pub fn is_witnessed(&self, block: u64, staker: &Address) -> bool {
        self.witnessed
            .get(&block)
            .is_some_and(|stakers| stakers.contains(staker))
    }

    /// Record a stake witness and update balances.
    ///
    /// Returns `None` if the event was already witnessed.
    pub fn apply_stake(&mut self, witness: &StakeWitness) -> Option<BalanceChange> {
        let fresh = self
            .witnessed
            .entry(witness.block)
            .or_default()
            .insert(witness.staker);
        if !fresh {
            return None;
        }
        Some(apply_stake_change(
            &mut self.balances,
            witness.staker,
            witness.kind,
            witness.amount,
        ))
    }

    /// Replace the round and quotas.
    pub fn apply_rebalance(&mut self, proposal: &RebalanceProposal) {
        self.round = proposal.round;
        self.limits = proposal.limits.clone();
    }

    /// Quota of `poster` in the current period.
    pub fn limit_of(&self, poster: &Address) -> Option<&Limit> {
        self.limits.get(poster)
    }

    /// Consume one order from `poster`'s quota.
    ///
    /// Returns the remaining quota, or `None` if nothing was left.
    pub fn consume_order_quota(&mut self, poster: &Address) -> Option<u64> {
        let limit = self.limits.get_mut(poster)?;
        limit.order_limit = limit.order_limit.checked_sub(1)?;
        Some(limit.order_limit)
    }

    /// Deterministic hash of the whole state.
    pub fn app_hash(&self) -> Hash {
        let mut hasher = StateHasher::new(STATE_HASH_DOMAIN);

        hasher
            .u64(self.round.number)
            .u64(self.round.starts_at)
            .u64(self.round.ends_at)
            .u64(self.round.limit);

        hasher.u64(self.witnessed.len() as u64);
        for (block, stakers) in &self.witnessed {
            hasher.u64(*block).u64(stakers.len() as u64);
            for staker in stakers {
                hasher.address(staker);
            }
        }

        hasher.u64(self.balances.len() as u64);
        for (staker, amount) in &self.balances {
            hasher.address(staker).u256(amount);
        }

        hasher.u64(self.limits.len() as u64);
        for (staker, limit) in &self.limits {
            hasher
                .address(staker)
                .u64(limit.order_limit)
                .u64(limit.stream_limit);
        }

        hasher
            .u64(self.order_counter)
            .u64(self.last_block_height)
            .bytes(self.last_block_app_hash.as_ref().map_or(&[][..], |h| &h[..]));

        hasher.finish()
    }
}
