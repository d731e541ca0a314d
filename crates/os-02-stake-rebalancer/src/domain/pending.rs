//! Stake events waiting for finality.

use shared_types::Address;
use std::collections::BTreeMap;

use super::entities::StakeEvent;

/// Events keyed by block, last write wins per staker within a block.
///
/// Matured heights are removed in ascending order with a single
/// `split_off`, so draining is proportional to what matures.
#[derive(Clone, Debug, Default)]
pub struct PendingEventBuffer {
    events: BTreeMap<u64, BTreeMap<Address, StakeEvent>>,
}

impl PendingEventBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event; returns the event it replaced, if any.
    pub fn insert(&mut self, event: StakeEvent) -> Option<StakeEvent> {
        self.events
            .entry(event.block)
            .or_default()
            .insert(event.staker, event)
    }

    /// Remove and return every event at or below `matured`, oldest first.
    pub fn drain_matured(&mut self, matured: u64) -> Vec<StakeEvent> {
        let ready = match matured.checked_add(1) {
            Some(first_unmatured) => {
                let rest = self.events.split_off(&first_unmatured);
                std::mem::replace(&mut self.events, rest)
            }
            None => std::mem::take(&mut self.events),
        };
        ready
            .into_values()
            .flat_map(BTreeMap::into_values)
            .collect()
    }

    /// Buffered events.
    pub fn len(&self) -> usize {
        self.events.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Lowest buffered block.
    pub fn oldest_block(&self) -> Option<u64> {
        self.events.keys().next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{StakeKind, U256};

    fn event(staker: u8, block: u64, amount: u64) -> StakeEvent {
        StakeEvent {
            staker: Address([staker; 20]),
            kind: StakeKind::Add,
            amount: U256::from(amount),
            block,
        }
    }

    #[test]
    fn test_last_write_wins_per_staker() {
        let mut buffer = PendingEventBuffer::new();
        assert!(buffer.insert(event(1, 10, 5)).is_none());
        assert_eq!(buffer.insert(event(1, 10, 9)), Some(event(1, 10, 5)));
        buffer.insert(event(2, 10, 1));
        assert_eq!(buffer.len(), 2);

        let drained = buffer.drain_matured(10);
        assert_eq!(drained, vec![event(1, 10, 9), event(2, 10, 1)]);
    }

    #[test]
    fn test_drain_is_ordered_and_bounded() {
        let mut buffer = PendingEventBuffer::new();
        buffer.insert(event(1, 30, 1));
        buffer.insert(event(1, 10, 1));
        buffer.insert(event(1, 20, 1));

        let drained: Vec<u64> = buffer.drain_matured(20).iter().map(|e| e.block).collect();
        assert_eq!(drained, vec![10, 20]);
        assert_eq!(buffer.oldest_block(), Some(30));
        assert!(buffer.drain_matured(29).is_empty());
    }

    #[test]
    fn test_drain_everything_at_max() {
        let mut buffer = PendingEventBuffer::new();
        buffer.insert(event(1, u64::MAX, 1));
        assert_eq!(buffer.drain_matured(u64::MAX).len(), 1);
        assert!(buffer.is_empty());
    }
}
