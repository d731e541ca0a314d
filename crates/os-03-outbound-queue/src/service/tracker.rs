//! # Order Tracker
//!
//! Holds orders accepted during the current block and hands them to
//! in-process subscribers when the block commits.
//!
//! Subscribers attach through a `tokio::sync::broadcast` channel. Having no
//! subscriber is not a delivery failure; delivering before the tracker is
//! activated is, and leaves the orders queued.

use shared_types::TaggedOrder;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::domain::{OutboundError, OutboundQueue, OutboundResult};

/// Default subscriber channel capacity.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

/// Per-block order queue with subscriber fan-out.
pub struct OrderTracker {
    queue: OutboundQueue<TaggedOrder>,
    sender: broadcast::Sender<TaggedOrder>,
    activated: bool,
}

impl Default for OrderTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl OrderTracker {
    /// New inactive tracker.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            queue: OutboundQueue::new(),
            sender,
            activated: false,
        }
    }

    /// Start delivering on commit.
    pub fn activate(&mut self) {
        if !self.activated {
            info!("[os-03] Order tracker activated");
        }
        self.activated = true;
    }

    /// Whether delivery is enabled.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Queue an accepted order.
    pub fn add(&mut self, order: TaggedOrder) {
        self.queue.add(order);
    }

    /// Orders waiting for the next commit.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Receive orders as blocks commit.
    pub fn subscribe(&self) -> broadcast::Receiver<TaggedOrder> {
        self.sender.subscribe()
    }

    /// Deliver every queued order to current subscribers, in order.
    pub fn trigger_broadcast(&mut self) -> OutboundResult<usize> {
        if !self.activated {
            return Err(OutboundError::NotActivated);
        }

        let sender = &self.sender;
        let delivered = self
            .queue
            .flush(|order| {
                // Err only means nobody is listening right now
                let _ = sender.send(order.clone());
                Ok::<_, OutboundError>(())
            })
            .map_err(|(_, e)| e)?;

        if delivered > 0 {
            debug!(
                "[os-03] Delivered {} orders to {} subscribers",
                delivered,
                sender.receiver_count()
            );
        }
        Ok(delivered)
    }
}
