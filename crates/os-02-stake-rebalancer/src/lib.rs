//! # OS-02 Stake Rebalancer
//!
//! Bridges an external chain's staking contract to OrderStream consensus.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! Stakers lock collateral on the external chain; their share of the total
//! stake becomes their share of each period's order throughput. The
//! rebalancer:
//! - ingests `StakeMade` / `StakeRemoved` logs
//! - holds them until `finality_threshold` confirmations
//! - witnesses matured events to consensus as `stake` transactions
//! - proposes a `rebalance` with proportional quotas when a period ends
//!
//! Proposals reach state only through consensus; the rebalancer adopts
//! whatever round consensus accepts.
//!
//! ## Lifecycle
//!
//! `Constructed → Initialized → Started`. [`StakeRebalancer::create`] runs
//! the first two steps and fails fast with a coded [`RebalancerError`].
//!
//! ## Module Structure
//!
//! ```text
//! os-02-stake-rebalancer/
//! ├── domain/      # StakeEvent, PendingEventBuffer, BalanceTable, gen_limits
//! ├── ports/       # BridgeEvent, StakingChain, TxSubmitter
//! ├── adapters/    # EthJsonRpcChain, TxSubmitter for Broadcaster
//! └── service.rs   # StakeRebalancer
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{EthJsonRpcChain, EthRpcConfig};
pub use domain::{
    gen_limits, BalanceTable, Lifecycle, PendingEventBuffer, RebalancerConfig, RebalancerError,
    RebalancerResult, StakeEvent, StakeLog, STREAM_LIMIT,
};
pub use ports::{BridgeEvent, MockStakingChain, RecordingSubmitter, StakingChain, TxSubmitter};
pub use service::StakeRebalancer;
