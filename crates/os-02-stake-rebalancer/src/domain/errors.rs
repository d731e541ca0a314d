//! Error types for the stake rebalancer.

use thiserror::Error;

/// Rebalancer failures. Each variant has a stable numeric [`code`].
///
/// [`code`]: RebalancerError::code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebalancerError {
    /// Provider URL does not parse.
    #[error("Invalid provider URL: {0}")]
    InvalidProviderUrl(String),

    /// Provider URL scheme is not http, https, ws or wss.
    #[error("Unsupported provider URI scheme: {0}")]
    UnsupportedUriScheme(String),

    /// Consensus RPC host/port do not form a URL.
    #[error("Invalid consensus RPC URL: {0}")]
    InvalidRpcUrl(String),

    /// External chain did not answer.
    #[error("External chain unreachable: {0}")]
    ChainUnreachable(String),

    /// Staking contract could not be bound.
    #[error("Unable to bind staking contract: {0}")]
    ContractBinding(String),

    /// Event subscription failed.
    #[error("Unable to subscribe to staking events: {0}")]
    Subscription(String),

    /// A bridge transaction could not be queued.
    #[error("Transaction submission failed: {0}")]
    TxFailed(String),

    /// `start` called twice.
    #[error("Rebalancer already started")]
    AlreadyStarted,

    /// `start` called before initialization.
    #[error("Rebalancer not initialized")]
    NotInitialized,

    /// Log with an event name other than `StakeMade` / `StakeRemoved`.
    #[error("Unknown staking event: {0}")]
    UnknownEvent(String),
}

impl RebalancerError {
    /// Stable error code.
    pub fn code(&self) -> u32 {
        match self {
            RebalancerError::InvalidProviderUrl(_) => 1,
            RebalancerError::UnsupportedUriScheme(_) => 2,
            RebalancerError::InvalidRpcUrl(_) => 3,
            RebalancerError::ChainUnreachable(_) => 4,
            RebalancerError::ContractBinding(_) => 5,
            RebalancerError::Subscription(_) => 6,
            RebalancerError::TxFailed(_) => 7,
            RebalancerError::AlreadyStarted => 8,
            RebalancerError::NotInitialized => 9,
            RebalancerError::UnknownEvent(_) => 10,
        }
    }
}

/// Result alias for rebalancer operations.
pub type RebalancerResult<T> = Result<T, RebalancerError>;
