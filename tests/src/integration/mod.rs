//! # Integration Test Flows
//!
//! Subsystems are wired the way the node runtime wires them, minus the
//! network: transactions travel as the encoded bytes consensus would carry,
//! and notifications are fed back by hand.

pub mod bridge_flow;
pub mod order_flow;
