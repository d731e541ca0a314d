//! HTTP order ingress.
//!
//! Any `POST` with an order JSON body is wrapped as an `OrderBroadcast`
//! transaction and submitted with `broadcast_tx_sync`. The consensus node's
//! answer is returned as-is; validation happens in `CheckTx`, not here.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use os_03_outbound_queue::{BroadcastResult, ConsensusRpc, OutboundError};
use shared_types::{codec, Order, Transaction};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Ingress failures, mapped to HTTP status codes.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Body was not a valid order.
    #[error("bad JSON: {0}")]
    BadJson(String),
    /// Order could not be encoded as a transaction.
    #[error("could not encode order: {0}")]
    Encoding(String),
    /// Consensus node did not answer.
    #[error("consensus RPC failed: {0}")]
    Rpc(#[from] OutboundError),
}

impl IngressError {
    /// Status code returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::BadJson(_) | IngressError::Encoding(_) => StatusCode::BAD_REQUEST,
            IngressError::Rpc(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "processed": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Router accepting orders on every path.
pub fn ingress_router<R: ConsensusRpc + 'static>(rpc: Arc<R>) -> Router {
    Router::new()
        .route("/", post(submit_order::<R>))
        .route("/*path", post(submit_order::<R>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(rpc)
}

async fn submit_order<R: ConsensusRpc + 'static>(
    State(rpc): State<Arc<R>>,
    payload: Result<Json<Order>, JsonRejection>,
) -> Result<Json<BroadcastResult>, IngressError> {
    let Json(order) = payload.map_err(|rejection| {
        warn!("[ingress] Rejected request body: {}", rejection.body_text());
        IngressError::BadJson(rejection.body_text())
    })?;

    let tx = codec::encode(&Transaction::OrderBroadcast(order))
        .map_err(|e| IngressError::Encoding(e.to_string()))?;

    let result = rpc.broadcast_tx_sync(&tx).await.map_err(|e| {
        warn!("[ingress] broadcast_tx_sync failed: {}", e);
        IngressError::Rpc(e)
    })?;
    debug!(
        "[ingress] Order submitted (code {}, hash {})",
        result.code, result.hash
    );
    Ok(Json(result))
}
