//! Runtime errors.

use os_02_stake_rebalancer::RebalancerError;
use os_03_outbound_queue::OutboundError;
use thiserror::Error;

use crate::container::ConfigError;

/// Failures while building or starting a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid configuration.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    /// Consensus RPC client could not be built.
    #[error("consensus RPC: {0}")]
    Outbound(#[from] OutboundError),
    /// Stake rebalancer failed to initialize or start.
    #[error("stake rebalancer (code {}): {0}", .0.code())]
    Rebalancer(#[from] RebalancerError),
    /// Ingress listener could not bind.
    #[error("ingress: {0}")]
    Io(#[from] std::io::Error),
    /// `start` called twice.
    #[error("node already started")]
    AlreadyStarted,
}

/// Result alias for runtime operations.
pub type NodeResult<T> = Result<T, NodeError>;
