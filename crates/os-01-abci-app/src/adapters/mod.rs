//! Adapters for the ABCI application.

pub mod order_queue;
