//! Domain layer for the stake rebalancer.

pub mod balances;
pub mod config;
pub mod entities;
pub mod errors;
pub mod limits;
pub mod pending;

pub use balances::BalanceTable;
pub use config::RebalancerConfig;
pub use entities::{Lifecycle, StakeEvent, StakeLog};
pub use errors::{RebalancerError, RebalancerResult};
pub use limits::{gen_limits, STREAM_LIMIT};
pub use pending::PendingEventBuffer;
