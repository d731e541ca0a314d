//! Driven ports: where accepted orders and block events go.

use os_03_outbound_queue::OutboundError;
use parking_lot::Mutex;
use shared_types::{Round, TaggedOrder};

/// Per-block queue of accepted orders.
pub trait OrderQueue: Send {
    /// Queue an order accepted in `deliver_tx`.
    fn add(&mut self, order: TaggedOrder);

    /// Deliver everything queued; items stay queued on failure.
    fn flush(&mut self) -> Result<usize, OutboundError>;
}

/// Signals from the consensus side to the stake rebalancer.
///
/// Implementations must not block: they are called from consensus callbacks.
pub trait RebalancerNotifier: Send + Sync {
    /// A new order-stream block began.
    fn order_stream_block(&self, height: u64, proposer: &[u8]);

    /// A rebalance was committed.
    fn round_accepted(&self, round: &Round);

    /// A block committed; pending bridge transactions may be submitted.
    fn block_committed(&self, height: u64);
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl RebalancerNotifier for NoopNotifier {
    fn order_stream_block(&self, _height: u64, _proposer: &[u8]) {}
    fn round_accepted(&self, _round: &Round) {}
    fn block_committed(&self, _height: u64) {}
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// `order_stream_block`
    Block {
        /// Height.
        height: u64,
        /// Proposer.
        proposer: Vec<u8>,
    },
    /// `round_accepted`
    Round(Round),
    /// `block_committed`
    Committed(u64),
}

/// Notifier that records calls, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far.
    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().clone()
    }

    /// Accepted rounds so far.
    pub fn rounds(&self) -> Vec<Round> {
        self.calls
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Round(r) => Some(*r),
                _ => None,
            })
            .collect()
    }
}

impl RebalancerNotifier for RecordingNotifier {
    fn order_stream_block(&self, height: u64, proposer: &[u8]) {
        self.calls.lock().push(Notification::Block {
            height,
            proposer: proposer.to_vec(),
        });
    }

    fn round_accepted(&self, round: &Round) {
        self.calls.lock().push(Notification::Round(*round));
    }

    fn block_committed(&self, height: u64) {
        self.calls.lock().push(Notification::Committed(height));
    }
}

impl<N: RebalancerNotifier + ?Sized> RebalancerNotifier for std::sync::Arc<N> {
    fn order_stream_block(&self, height: u64, proposer: &[u8]) {
        (**self).order_stream_block(height, proposer)
    }

    fn round_accepted(&self, round: &Round) {
        (**self).round_accepted(round)
    }

    fn block_committed(&self, height: u64) {
        (**self).block_committed(height)
    }
}
