//! Consensus-to-bridge notifier.
//!
//! Runs inside consensus callbacks, so every call is non-blocking. Block
//! events go through `try_send` on the bounded bridge channel and may be
//! dropped under load. Accepted rounds go on an unbounded channel, since
//! the bridge cannot propose the next round without them.

use os_01_abci_app::RebalancerNotifier;
use os_02_stake_rebalancer::BridgeEvent;
use os_03_outbound_queue::Broadcaster;
use shared_types::Round;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Forwards ABCI block events to the stake rebalancer's event loop.
#[derive(Clone)]
pub struct BridgeNotifier {
    events: mpsc::Sender<BridgeEvent>,
    rounds: mpsc::UnboundedSender<Round>,
    broadcaster: Broadcaster,
}

impl BridgeNotifier {
    /// Notifier feeding `events` and `rounds`, triggering `broadcaster` on
    /// commit.
    pub fn new(
        events: mpsc::Sender<BridgeEvent>,
        rounds: mpsc::UnboundedSender<Round>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            events,
            rounds,
            broadcaster,
        }
    }
}

impl RebalancerNotifier for BridgeNotifier {
    fn order_stream_block(&self, height: u64, proposer: &[u8]) {
        let event = BridgeEvent::OrderStreamBlock {
            height,
            proposer: proposer.to_vec(),
        };
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("[os-01] Bridge event channel full, dropped {:?}", event);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("[os-01] Bridge event loop not running");
            }
        }
    }

    fn round_accepted(&self, round: &Round) {
        if self.rounds.send(*round).is_err() {
            debug!(
                "[os-01] Bridge event loop not running, round {} not forwarded",
                round.number
            );
        }
    }

    fn block_committed(&self, _height: u64) {
        self.broadcaster.trigger();
    }
}
