//! Rebalancer configuration.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Configuration for [`StakeRebalancer`](crate::StakeRebalancer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancerConfig {
    /// External chain JSON-RPC endpoint.
    pub provider_url: String,
    /// Period length in external blocks.
    pub period_length: u64,
    /// Orders accepted per period across all stakers.
    pub period_limit: u64,
    /// Confirmations before a stake event counts.
    pub finality_threshold: u64,
    /// Deployed staking contract.
    pub stake_contract: Address,
    /// Consensus RPC host the bridge submits to.
    pub tendermint_rpc_host: String,
    /// Consensus RPC port.
    pub tendermint_rpc_port: u16,
}

impl Default for RebalancerConfig {
    fn default() -> Self {
        Self {
            provider_url: "ws://localhost:8546".to_string(),
            period_length: 20,
            period_limit: 100_000,
            finality_threshold: 12,
            stake_contract: Address::ZERO,
            tendermint_rpc_host: "localhost".to_string(),
            tendermint_rpc_port: 26657,
        }
    }
}

impl RebalancerConfig {
    /// Blocks to wait before re-proposing an unaccepted rebalance.
    pub fn proposal_retry_blocks(&self) -> u64 {
        self.finality_threshold.max(1)
    }
}
