//! Tendermint JSON-RPC client.
//!
//! Only `broadcast_tx_sync` is needed: transactions are base64 encoded into
//! the `tx` parameter and the node answers after running `CheckTx`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::domain::{OutboundError, OutboundResult};
use crate::ports::{BroadcastResult, ConsensusRpc};

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    /// Always "2.0".
    pub jsonrpc: &'static str,
    /// Method name.
    pub method: String,
    /// Method parameters.
    pub params: T,
    /// Request ID.
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    /// Build a request.
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Result on success.
    pub result: Option<T>,
    /// Error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Extra detail (Tendermint puts the useful part here).
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl<T> JsonRpcResponse<T> {
    /// Collapse into the result or a typed error.
    pub fn into_result(self) -> OutboundResult<T> {
        if let Some(error) = self.error {
            let message = match error.data {
                Some(serde_json::Value::String(data)) => format!("{}: {}", error.message, data),
                _ => error.message,
            };
            return Err(OutboundError::Rpc {
                code: error.code,
                message,
            });
        }
        self.result
            .ok_or_else(|| OutboundError::Parse("Missing result in response".to_string()))
    }
}

#[derive(Serialize)]
struct BroadcastParams {
    tx: String,
}

/// HTTP client for a Tendermint node's RPC endpoint.
pub struct TendermintRpcClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl TendermintRpcClient {
    /// Client for `http://{host}:{port}`.
    pub fn new(host: &str, port: u16) -> OutboundResult<Self> {
        if host.is_empty() {
            return Err(OutboundError::InvalidEndpoint("empty host".to_string()));
        }
        Self::with_endpoint(format!("http://{}:{}", host, port))
    }

    /// Client for a full endpoint URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> OutboundResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> OutboundResult<R> {
        let request = JsonRpcRequest::new(method, params, self.next_id());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OutboundError::Connection(format!("Cannot connect to {}", self.endpoint))
                } else {
                    OutboundError::Http(e)
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| OutboundError::Parse(e.to_string()))?;

        rpc_response.into_result()
    }
}

#[async_trait]
impl ConsensusRpc for TendermintRpcClient {
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> OutboundResult<BroadcastResult> {
        let params = BroadcastParams {
            tx: STANDARD.encode(tx),
        };
        let result: BroadcastResult = self.call("broadcast_tx_sync", params).await?;
        debug!(
            "[os-03] broadcast_tx_sync code={} hash={}",
            result.code, result.hash
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let params = BroadcastParams {
            tx: STANDARD.encode([1u8, 2, 3]),
        };
        let request = JsonRpcRequest::new("broadcast_tx_sync", params, 7);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "broadcast_tx_sync");
        assert_eq!(json["params"]["tx"], "AQID");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_response_result() {
        let response: JsonRpcResponse<BroadcastResult> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":-1,"result":{"code":0,"data":"","log":"","hash":"AB12"}}"#,
        )
        .unwrap();
        let result = response.into_result().unwrap();
        assert!(result.is_accepted());
        assert_eq!(result.hash, "AB12");
    }

    #[test]
    fn test_response_error_includes_data() {
        let response: JsonRpcResponse<BroadcastResult> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"Internal error","data":"tx already exists in cache"}}"#,
        )
        .unwrap();
        match response.into_result() {
            Err(OutboundError::Rpc { code, message }) => {
                assert_eq!(code, -32603);
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(matches!(
            TendermintRpcClient::new("", 26657),
            Err(OutboundError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_endpoint_format() {
        let client = TendermintRpcClient::new("localhost", 26657).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:26657");
    }
}
