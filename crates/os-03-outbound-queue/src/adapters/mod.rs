//! Adapters for the outbound queue.

pub mod tendermint_rpc;

pub use tendermint_rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, TendermintRpcClient};
