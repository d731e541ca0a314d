//! Outbound queue services.

pub mod broadcaster;
pub mod tracker;

pub use broadcaster::{BroadcastWorker, Broadcaster, DEFAULT_RETRY_INTERVAL};
pub use tracker::{OrderTracker, DEFAULT_SUBSCRIBER_CAPACITY};
