//! # Stake Balances
//!
//! The one balance update rule shared by the ABCI state machine and the
//! stake rebalancer. Both must agree bit for bit, otherwise the limits a
//! node proposes would diverge from the limits consensus accepts.

use crate::entities::{Address, BalanceMapping, U256};
use crate::transaction::StakeKind;

/// What a stake change did to the balance table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceChange {
    /// Amount added.
    Credited,
    /// Amount removed.
    Debited,
    /// Removal larger than the balance; the entry was cleared.
    Clamped {
        /// Part of the removal that exceeded the balance.
        shortfall: U256,
    },
    /// Removal for a staker with no balance; nothing changed.
    UnknownStaker,
}

/// Apply one stake event. Zero balances are deleted.
pub fn apply_stake_change(
    balances: &mut BalanceMapping,
    staker: Address,
    kind: StakeKind,
    amount: U256,
) -> BalanceChange {
    match kind {
        StakeKind::Add => {
            let entry = balances.entry(staker).or_insert_with(U256::zero);
            *entry = entry.saturating_add(amount);
            if entry.is_zero() {
                balances.remove(&staker);
            }
            BalanceChange::Credited
        }
        StakeKind::Remove => {
            let Some(current) = balances.get(&staker).copied() else {
                return BalanceChange::UnknownStaker;
            };
            let change = if amount > current {
                BalanceChange::Clamped {
                    shortfall: amount - current,
                }
            } else {
                BalanceChange::Debited
            };
            let remaining = current.saturating_sub(amount);
            if remaining.is_zero() {
                balances.remove(&staker);
            } else {
                balances.insert(staker, remaining);
            }
            change
        }
    }
}
