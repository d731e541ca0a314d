//! # Ethereum JSON-RPC Staking Chain
//!
//! Polls an Ethereum-compatible node over HTTP JSON-RPC:
//!
//! - `eth_blockNumber` for the head
//! - `eth_getLogs` for `StakeMade` / `StakeRemoved` on the staking contract
//! - `eth_getCode` to confirm the contract exists
//!
//! Logs are fetched in bounded block ranges and always forwarded before the
//! head they belong to. A failed poll is retried with exponential backoff
//! from the same cursor, so nothing is skipped across reconnects.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::{keccak256, Address, Hash, U256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{RebalancerError, RebalancerResult, StakeLog};
use crate::ports::{BridgeEvent, StakingChain};

/// Event signature of `StakeMade`.
pub const STAKE_MADE_SIGNATURE: &str = "StakeMade(address,uint256)";
/// Event signature of `StakeRemoved`.
pub const STAKE_REMOVED_SIGNATURE: &str = "StakeRemoved(address,uint256)";

/// Polling parameters.
#[derive(Clone, Debug)]
pub struct EthRpcConfig {
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Maximum block range per `eth_getLogs`.
    pub log_chunk_size: u64,
    /// Upper bound for the retry delay.
    pub max_backoff: Duration,
}

impl Default for EthRpcConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            log_chunk_size: 5_000,
            max_backoff: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_getLogs` entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    /// Indexed topics, `topics[0]` is the event signature hash.
    pub topics: Vec<String>,
    /// ABI-encoded non-indexed arguments.
    pub data: String,
    /// Block number; absent for pending logs.
    #[serde(default)]
    pub block_number: Option<String>,
    /// Position in the block.
    #[serde(default)]
    pub log_index: Option<String>,
    /// Set when the log was dropped by a reorg.
    #[serde(default)]
    pub removed: bool,
}

/// Staking chain reached over Ethereum JSON-RPC.
#[derive(Clone)]
pub struct EthJsonRpcChain {
    client: Client,
    endpoint: Url,
    config: EthRpcConfig,
    request_id: Arc<AtomicU64>,
    stake_made_topic: Hash,
    stake_removed_topic: Hash,
}

impl EthJsonRpcChain {
    /// Client for an `http`/`https` endpoint.
    pub fn new(endpoint: &str, config: EthRpcConfig) -> RebalancerResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RebalancerError::InvalidProviderUrl(format!("{}: {}", endpoint, e)))?;
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RebalancerError::UnsupportedUriScheme(format!(
                    "{} (polling needs an http or https endpoint)",
                    other
                )))
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| RebalancerError::ChainUnreachable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            stake_made_topic: keccak256(STAKE_MADE_SIGNATURE.as_bytes()),
            stake_removed_topic: keccak256(STAKE_REMOVED_SIGNATURE.as_bytes()),
        })
    }

    async fn call<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> RebalancerResult<R> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| RebalancerError::ChainUnreachable(format!("{}: {}", method, e)))?;

        let rpc: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RebalancerError::ChainUnreachable(format!("{}: {}", method, e)))?;

        if let Some(error) = rpc.error {
            return Err(RebalancerError::ChainUnreachable(format!(
                "{}: RPC error {}: {}",
                method, error.code, error.message
            )));
        }
        rpc.result.ok_or_else(|| {
            RebalancerError::ChainUnreachable(format!("{}: missing result", method))
        })
    }

    /// Stake logs of `contract` in `[from, to]`, in chain order.
    pub async fn get_logs(
        &self,
        contract: Address,
        from: u64,
        to: u64,
    ) -> RebalancerResult<Vec<StakeLog>> {
        let filter = json!({
            "address": contract.to_string(),
            "fromBlock": format!("0x{:x}", from),
            "toBlock": format!("0x{:x}", to),
            "topics": [[
                format!("0x{}", hex::encode(self.stake_made_topic)),
                format!("0x{}", hex::encode(self.stake_removed_topic)),
            ]],
        });
        let mut logs: Vec<RpcLog> = self.call("eth_getLogs", [filter]).await?;

        logs.sort_by_key(|log| {
            (
                log.block_number.as_deref().and_then(|n| parse_quantity(n).ok()),
                log.log_index.as_deref().and_then(|i| parse_quantity(i).ok()),
            )
        });

        let mut out = Vec::with_capacity(logs.len());
        for log in &logs {
            match self.decode_log(log) {
                Ok(Some(stake)) => out.push(stake),
                Ok(None) => {}
                Err(e) => warn!("[os-02] Skipping undecodable stake log: {}", e),
            }
        }
        Ok(out)
    }

    /// Decode one log; `None` for removed or pending logs.
    pub fn decode_log(&self, log: &RpcLog) -> Result<Option<StakeLog>, String> {
        if log.removed {
            warn!("[os-02] Ignoring log removed by reorg");
            return Ok(None);
        }
        let Some(block) = log.block_number.as_deref() else {
            return Ok(None);
        };
        let block = parse_quantity(block)?;

        let topic0 = log.topics.first().ok_or("log without topics")?;
        let topic0 = shared_types::serde_hex::decode_fixed::<32>(topic0)?;
        let event = if topic0 == self.stake_made_topic {
            "StakeMade"
        } else if topic0 == self.stake_removed_topic {
            "StakeRemoved"
        } else {
            return Err(format!("unexpected topic 0x{}", hex::encode(topic0)));
        };

        let data = hex::decode(log.data.strip_prefix("0x").unwrap_or(&log.data))
            .map_err(|e| format!("invalid log data: {}", e))?;
        let words: Vec<[u8; 32]> = data
            .chunks_exact(32)
            .map(|chunk| {
                let mut word = [0u8; 32];
                word.copy_from_slice(chunk);
                word
            })
            .collect();

        // The staker is either indexed (topic 1) or the first data word
        let (staker, amount) = match log.topics.get(1) {
            Some(topic) => {
                let word = shared_types::serde_hex::decode_fixed::<32>(topic)?;
                let amount = words.first().ok_or("missing amount word")?;
                (Address::from_word(&word), U256::from_big_endian(amount))
            }
            None => {
                let (staker, amount) = match words.as_slice() {
                    [staker, amount, ..] => (staker, amount),
                    _ => return Err("expected staker and amount words".to_string()),
                };
                (Address::from_word(staker), U256::from_big_endian(amount))
            }
        };

        Ok(Some(StakeLog {
            event: event.to_string(),
            staker,
            amount,
            block,
        }))
    }

    async fn poll_once(
        &self,
        contract: Address,
        next_log_block: &mut u64,
        last_head: &mut Option<u64>,
        sink: &mpsc::Sender<BridgeEvent>,
    ) -> RebalancerResult<bool> {
        let head = self.block_number().await?;
        let chunk = self.config.log_chunk_size.max(1);

        while *next_log_block <= head {
            let to = head.min(next_log_block.saturating_add(chunk - 1));
            let logs = self.get_logs(contract, *next_log_block, to).await?;
            if !logs.is_empty() {
                debug!(
                    "[os-02] {} stake logs in blocks {}..={}",
                    logs.len(),
                    next_log_block,
                    to
                );
            }
            for log in logs {
                if sink.send(BridgeEvent::StakeLog(log)).await.is_err() {
                    return Ok(false);
                }
            }
            *next_log_block = to + 1;
        }

        if last_head.map_or(true, |h| head > h) {
            if sink.send(BridgeEvent::NewBlock(head)).await.is_err() {
                return Ok(false);
            }
            *last_head = Some(head);
        }
        Ok(true)
    }

    async fn poll_loop(self, contract: Address, from_block: u64, sink: mpsc::Sender<BridgeEvent>) {
        let mut next_log_block = from_block;
        let mut last_head = None;
        let mut backoff = self.config.poll_interval;

        info!(
            "[os-02] Polling {} for stake events from block {}",
            self.endpoint, from_block
        );
        loop {
            match self
                .poll_once(contract, &mut next_log_block, &mut last_head, &sink)
                .await
            {
                Ok(true) => backoff = self.config.poll_interval,
                Ok(false) => break,
                Err(e) => {
                    warn!(
                        "[os-02] External chain poll failed, retrying in {:?}: {}",
                        backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                    continue;
                }
            }
            if sink.is_closed() {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
        info!("[os-02] Stake event polling stopped");
    }
}

#[async_trait]
impl StakingChain for EthJsonRpcChain {
    async fn block_number(&self) -> RebalancerResult<u64> {
        let head: String = self.call("eth_blockNumber", [(); 0]).await?;
        parse_quantity(&head).map_err(RebalancerError::ChainUnreachable)
    }

    async fn bind_contract(&self, contract: Address) -> RebalancerResult<()> {
        let code: String = self
            .call("eth_getCode", (contract.to_string(), "latest"))
            .await
            .map_err(|e| RebalancerError::ContractBinding(e.to_string()))?;
        let code = code.strip_prefix("0x").unwrap_or(&code);
        if code.is_empty() {
            return Err(RebalancerError::ContractBinding(format!(
                "no contract deployed at {}",
                contract
            )));
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        contract: Address,
        from_block: u64,
        sink: mpsc::Sender<BridgeEvent>,
    ) -> RebalancerResult<()> {
        self.block_number()
            .await
            .map_err(|e| RebalancerError::Subscription(e.to_string()))?;
        tokio::spawn(self.clone().poll_loop(contract, from_block, sink));
        Ok(())
    }
}

/// Parse a JSON-RPC hex quantity (`0x1b4`).
pub fn parse_quantity(s: &str) -> Result<u64, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Err(format!("empty quantity: {:?}", s));
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid quantity {:?}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> EthJsonRpcChain {
        EthJsonRpcChain::new("http://localhost:8545", EthRpcConfig::default()).unwrap()
    }

    fn word(bytes: &[u8]) -> String {
        let mut w = [0u8; 32];
        w[32 - bytes.len()..].copy_from_slice(bytes);
        hex::encode(w)
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1b4"), Ok(436));
        assert_eq!(parse_quantity("0x0"), Ok(0));
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_ws_endpoint_rejected() {
        assert!(matches!(
            EthJsonRpcChain::new("ws://localhost:8546", EthRpcConfig::default()),
            Err(RebalancerError::UnsupportedUriScheme(_))
        ));
    }

    #[test]
    fn test_decode_unindexed_staker() {
        let chain = chain();
        let staker = [0x42u8; 20];
        let log = RpcLog {
            topics: vec![format!("0x{}", hex::encode(chain.stake_made_topic))],
            data: format!("0x{}{}", word(&staker), word(&[0x01, 0x00])),
            block_number: Some("0x10".to_string()),
            log_index: Some("0x0".to_string()),
            removed: false,
        };
        let decoded = chain.decode_log(&log).unwrap().unwrap();
        assert_eq!(decoded.event, "StakeMade");
        assert_eq!(decoded.staker, Address(staker));
        assert_eq!(decoded.amount, U256::from(256u64));
        assert_eq!(decoded.block, 16);
    }

    #[test]
    fn test_decode_indexed_staker() {
        let chain = chain();
        let staker = [0x07u8; 20];
        let log = RpcLog {
            topics: vec![
                format!("0x{}", hex::encode(chain.stake_removed_topic)),
                format!("0x{}", word(&staker)),
            ],
            data: format!("0x{}", word(&[0x09])),
            block_number: Some("0x2".to_string()),
            log_index: None,
            removed: false,
        };
        let decoded = chain.decode_log(&log).unwrap().unwrap();
        assert_eq!(decoded.event, "StakeRemoved");
        assert_eq!(decoded.staker, Address(staker));
        assert_eq!(decoded.amount, U256::from(9u64));
    }

    #[test]
    fn test_removed_and_pending_logs_skipped() {
        let chain = chain();
        let mut log = RpcLog {
            topics: vec![format!("0x{}", hex::encode(chain.stake_made_topic))],
            data: "0x".to_string(),
            block_number: None,
            log_index: None,
            removed: false,
        };
        assert_eq!(chain.decode_log(&log), Ok(None));
        log.block_number = Some("0x1".to_string());
        log.removed = true;
        assert_eq!(chain.decode_log(&log), Ok(None));
    }

    #[test]
    fn test_foreign_topic_is_error() {
        let chain = chain();
        let log = RpcLog {
            topics: vec![format!("0x{}", word(&[1]))],
            data: "0x".to_string(),
            block_number: Some("0x1".to_string()),
            log_index: None,
            removed: false,
        };
        assert!(chain.decode_log(&log).is_err());
    }
}
