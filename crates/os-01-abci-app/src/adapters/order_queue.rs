//! [`OrderQueue`] backed by the outbound queue subsystem's order tracker.

use os_03_outbound_queue::{OrderTracker, OutboundError};
use shared_types::TaggedOrder;

use crate::ports::OrderQueue;

impl OrderQueue for OrderTracker {
    fn add(&mut self, order: TaggedOrder) {
        OrderTracker::add(self, order);
    }

    fn flush(&mut self) -> Result<usize, OutboundError> {
        self.trigger_broadcast()
    }
}
