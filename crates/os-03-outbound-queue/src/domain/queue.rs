//! # Outbound Queue
//!
//! FIFO of items accepted during a block, delivered once per commit.
//!
//! Delivery is at-least-once: an item is removed only after its delivery
//! succeeded, so a failed flush leaves it (and everything behind it) queued
//! for the next attempt.

use std::collections::VecDeque;

/// Ordered buffer of pending deliveries.
#[derive(Debug)]
pub struct OutboundQueue<T> {
    items: VecDeque<T>,
}

impl<T> Default for OutboundQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutboundQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item in acceptance order.
    pub fn add(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Oldest undelivered item.
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Drop the oldest item after successful delivery.
    pub fn ack(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deliver every queued item in order.
    ///
    /// Stops at the first failure, keeping the failed item at the head.
    /// Returns the number of items delivered.
    pub fn flush<E, F>(&mut self, mut deliver: F) -> Result<usize, (usize, E)>
    where
        F: FnMut(&T) -> Result<(), E>,
    {
        let mut delivered = 0;
        while let Some(item) = self.items.front() {
            match deliver(item) {
                Ok(()) => {
                    self.items.pop_front();
                    delivered += 1;
                }
                Err(e) => return Err((delivered, e)),
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_preserves_order() {
        let mut queue = OutboundQueue::new();
        for i in 0..5 {
            queue.add(i);
        }
        let mut seen = Vec::new();
        let delivered = queue
            .flush(|item| {
                seen.push(*item);
                Ok::<_, ()>(())
            })
            .unwrap();
        assert_eq!(delivered, 5);
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failed_flush_keeps_remaining_items() {
        let mut queue = OutboundQueue::new();
        queue.add("a");
        queue.add("b");
        queue.add("c");

        let result = queue.flush(|item| if *item == "b" { Err("down") } else { Ok(()) });
        assert_eq!(result, Err((1, "down")));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek(), Some(&"b"));

        // Retry delivers the rest without loss
        let mut seen = Vec::new();
        queue
            .flush(|item| {
                seen.push(*item);
                Ok::<_, ()>(())
            })
            .unwrap();
        assert_eq!(seen, vec!["b", "c"]);
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let mut queue: OutboundQueue<u8> = OutboundQueue::new();
        assert_eq!(queue.flush(|_| Err::<(), _>("never called")), Ok(0));
    }
}
