//! Domain layer for the outbound queue.

pub mod errors;
pub mod queue;

pub use errors::{OutboundError, OutboundResult};
pub use queue::OutboundQueue;
