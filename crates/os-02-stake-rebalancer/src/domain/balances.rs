//! Out-of-state balance table maintained by the rebalancer.

use shared_types::{apply_stake_change, Address, BalanceChange, BalanceMapping, U256};

use super::entities::StakeEvent;

/// Staked amount per staker; zero balances are deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceTable {
    balances: BalanceMapping,
}

impl BalanceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a matured event.
    pub fn apply(&mut self, event: &StakeEvent) -> BalanceChange {
        apply_stake_change(&mut self.balances, event.staker, event.kind, event.amount)
    }

    /// Balance of `staker`, zero if absent.
    pub fn get(&self, staker: &Address) -> U256 {
        self.balances.get(staker).copied().unwrap_or_default()
    }

    /// Underlying mapping.
    pub fn as_map(&self) -> &BalanceMapping {
        &self.balances
    }

    /// Number of stakers with a balance.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether nobody has stake.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
