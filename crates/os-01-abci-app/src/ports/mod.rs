//! Ports for the ABCI application.

pub mod inbound;
pub mod outbound;

pub use inbound::{AbciApplication, BlockHeader, InfoResponse};
pub use outbound::{Notification, NoopNotifier, OrderQueue, RebalancerNotifier, RecordingNotifier};
