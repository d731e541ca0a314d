//! # Subsystem Container
//!
//! Central container holding the subsystem instances a node shares between
//! its tasks.
//!
//! - Consensus callbacks reach the app through one mutex; ABCI is sequential
//!   so the lock is never contended by consensus itself
//! - The bridge is reached only through its event channel

pub mod config;
pub mod subsystems;

pub use config::{load_config, ConfigError, NodeConfig};
pub use subsystems::{BridgeReceivers, NodeApp, SharedApp, SubsystemContainer};
