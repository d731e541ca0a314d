//! Adapters for the stake rebalancer.

pub mod eth_rpc;
pub mod submitter;

pub use eth_rpc::{EthJsonRpcChain, EthRpcConfig};
