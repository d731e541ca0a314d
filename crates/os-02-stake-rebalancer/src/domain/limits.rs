//! # Quota Generation
//!
//! Each staker's order quota is proportional to its share of total stake:
//!
//! ```text
//! orderLimit = floor(balance * periodLimit / totalStake)
//! ```
//!
//! computed in exact integer arithmetic (256-bit balances, 512-bit
//! products), so every node derives the same mapping from the same balances.

use shared_types::{BalanceMapping, Limit, LimitMapping, U512};

/// Concurrent streams granted to every staker.
pub const STREAM_LIMIT: u64 = 1;

/// Proportional quotas for `balances` sharing `period_limit` orders.
///
/// The sum of all `order_limit`s never exceeds `period_limit`. An empty or
/// all-zero balance table yields an empty mapping.
pub fn gen_limits(balances: &BalanceMapping, period_limit: u64) -> LimitMapping {
    let total = balances
        .values()
        .fold(U512::zero(), |acc, b| acc + U512::from(*b));
    if total.is_zero() {
        return LimitMapping::new();
    }

    balances
        .iter()
        .map(|(staker, balance)| {
            let share = balance.full_mul(period_limit.into()) / total;
            (
                *staker,
                Limit {
                    // share <= period_limit, so it fits
                    order_limit: share.low_u64(),
                    stream_limit: STREAM_LIMIT,
                },
            )
        })
        .collect()
}
