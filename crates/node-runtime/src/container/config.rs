//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Defaults are suitable for a local single-node network. Every value that
//! differs between deployments can be overridden with an `OS_*` environment
//! variable (see [`load_config`]).

use std::str::FromStr;
use std::time::Duration;

use os_01_abci_app::{AbciConfig, QuotaPolicy};
use os_02_stake_rebalancer::{EthRpcConfig, RebalancerConfig};
use shared_types::Address;
use thiserror::Error;
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// ABCI application configuration.
    pub abci: AbciSection,
    /// Stake bridge configuration.
    pub bridge: BridgeConfig,
    /// Consensus node RPC configuration.
    pub consensus_rpc: ConsensusRpcConfig,
    /// HTTP order ingress configuration.
    pub api: ApiConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment override could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
    /// Period length must be positive.
    #[error("period length must be greater than zero")]
    ZeroPeriodLength,
    /// Period limit must be positive.
    #[error("period limit must be greater than zero")]
    ZeroPeriodLimit,
    /// The bridge is enabled without a staking contract.
    #[error("bridge enabled but no staking contract configured (set OS_STAKE_CONTRACT)")]
    MissingStakeContract,
    /// Consensus RPC host is empty.
    #[error("consensus RPC host is empty")]
    EmptyRpcHost,
}

/// ABCI application section.
#[derive(Debug, Clone)]
pub struct AbciSection {
    /// Order quota enforcement.
    pub quota_policy: QuotaPolicy,
    /// Capacity of the accepted-order subscriber channel.
    pub subscriber_capacity: usize,
}

impl Default for AbciSection {
    fn default() -> Self {
        Self {
            quota_policy: QuotaPolicy::Unmetered,
            subscriber_capacity: os_03_outbound_queue::DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

impl AbciSection {
    /// Application configuration for [`os_01_abci_app::OrderStreamApp`].
    pub fn app_config(&self) -> AbciConfig {
        AbciConfig {
            quota_policy: self.quota_policy,
            ..AbciConfig::default()
        }
    }
}

/// Stake bridge section.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Run the stake rebalancer.
    pub enabled: bool,
    /// External chain JSON-RPC endpoint (http or https).
    pub provider_url: String,
    /// Period length in external blocks.
    pub period_length: u64,
    /// Orders per period across all stakers.
    pub period_limit: u64,
    /// Confirmations before a stake event counts.
    pub finality_threshold: u64,
    /// Staking contract address.
    pub stake_contract: Address,
    /// External chain poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum block range per log query.
    pub log_chunk_size: u64,
    /// Capacity of the bridge event channel.
    pub event_buffer: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider_url: "http://localhost:8545".to_string(),
            period_length: 20,
            period_limit: 100_000,
            finality_threshold: 12,
            stake_contract: Address::ZERO,
            poll_interval_ms: 4_000,
            log_chunk_size: 5_000,
            event_buffer: 4_096,
        }
    }
}

/// Consensus node RPC section.
#[derive(Debug, Clone)]
pub struct ConsensusRpcConfig {
    /// Host of the consensus node's RPC server.
    pub host: String,
    /// Port of the consensus node's RPC server.
    pub port: u16,
    /// Delay before re-submitting bridge transactions after a failure.
    pub retry_interval_ms: u64,
}

impl Default for ConsensusRpcConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 26657,
            retry_interval_ms: 2_000,
        }
    }
}

/// HTTP order ingress section.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Serve the order ingress.
    pub enabled: bool,
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

impl NodeConfig {
    /// Check cross-field constraints before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consensus_rpc.host.is_empty() {
            return Err(ConfigError::EmptyRpcHost);
        }
        if self.bridge.enabled {
            if self.bridge.period_length == 0 {
                return Err(ConfigError::ZeroPeriodLength);
            }
            if self.bridge.period_limit == 0 {
                return Err(ConfigError::ZeroPeriodLimit);
            }
            if self.bridge.stake_contract == Address::ZERO {
                return Err(ConfigError::MissingStakeContract);
            }
        }
        Ok(())
    }

    /// Rebalancer configuration derived from the bridge and RPC sections.
    pub fn rebalancer_config(&self) -> RebalancerConfig {
        RebalancerConfig {
            provider_url: self.bridge.provider_url.clone(),
            period_length: self.bridge.period_length,
            period_limit: self.bridge.period_limit,
            finality_threshold: self.bridge.finality_threshold,
            stake_contract: self.bridge.stake_contract,
            tendermint_rpc_host: self.consensus_rpc.host.clone(),
            tendermint_rpc_port: self.consensus_rpc.port,
        }
    }

    /// Polling parameters for the external chain adapter.
    pub fn eth_rpc_config(&self) -> EthRpcConfig {
        EthRpcConfig {
            poll_interval: Duration::from_millis(self.bridge.poll_interval_ms),
            log_chunk_size: self.bridge.log_chunk_size.max(1),
            ..EthRpcConfig::default()
        }
    }

    /// Broadcaster retry interval.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.consensus_rpc.retry_interval_ms)
    }

    /// Apply overrides from `lookup`, keyed by `OS_*` variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OS_QUOTA_POLICY") {
            self.abci.quota_policy = parse("OS_QUOTA_POLICY", v)?;
        }
        if let Some(v) = lookup("OS_BRIDGE_ENABLED") {
            self.bridge.enabled = parse_flag("OS_BRIDGE_ENABLED", v)?;
        }
        if let Some(v) = lookup("OS_WEB3_PROVIDER") {
            self.bridge.provider_url = v;
        }
        if let Some(v) = lookup("OS_PERIOD_LENGTH") {
            self.bridge.period_length = parse("OS_PERIOD_LENGTH", v)?;
        }
        if let Some(v) = lookup("OS_PERIOD_LIMIT") {
            self.bridge.period_limit = parse("OS_PERIOD_LIMIT", v)?;
        }
        if let Some(v) = lookup("OS_FINALITY_THRESHOLD") {
            self.bridge.finality_threshold = parse("OS_FINALITY_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("OS_STAKE_CONTRACT") {
            self.bridge.stake_contract = parse("OS_STAKE_CONTRACT", v)?;
        }
        if let Some(v) = lookup("OS_POLL_INTERVAL_MS") {
            self.bridge.poll_interval_ms = parse("OS_POLL_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("OS_ABCI_HOST") {
            self.consensus_rpc.host = v;
        }
        if let Some(v) = lookup("OS_ABCI_RPC_PORT") {
            self.consensus_rpc.port = parse("OS_ABCI_RPC_PORT", v)?;
        }
        if let Some(v) = lookup("OS_API_ENABLED") {
            self.api.enabled = parse_flag("OS_API_ENABLED", v)?;
        }
        if let Some(v) = lookup("OS_API_PORT") {
            self.api.port = parse("OS_API_PORT", v)?;
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

/// Load configuration from defaults and the process environment, then
/// validate it.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    let mut config = NodeConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    info!(
        "Configuration loaded (bridge: {}, api: {})",
        config.bridge.enabled, config.api.enabled
    );
    Ok(config)
}
