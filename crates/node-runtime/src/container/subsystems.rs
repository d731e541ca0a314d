//! Subsystem construction.

use std::sync::Arc;

use os_01_abci_app::{CommitState, OrderStreamApp};
use os_02_stake_rebalancer::BridgeEvent;
use os_03_outbound_queue::{Broadcaster, OrderTracker, TendermintRpcClient};
use parking_lot::Mutex;
use shared_types::{Round, TaggedOrder};
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use super::config::NodeConfig;
use crate::adapters::BridgeNotifier;
use crate::errors::NodeResult;

/// The ABCI application as wired in a running node.
pub type NodeApp = OrderStreamApp<OrderTracker, BridgeNotifier>;

/// Handle to the application shared with the consensus transport.
pub type SharedApp = Arc<Mutex<NodeApp>>;

/// Receiving ends of the bridge event loop: chain and block events, then
/// accepted rounds.
pub type BridgeReceivers = (mpsc::Receiver<BridgeEvent>, mpsc::UnboundedReceiver<Round>);

/// All subsystem instances of one node.
pub struct SubsystemContainer {
    /// Node configuration.
    pub config: NodeConfig,
    /// ABCI application.
    pub app: SharedApp,
    /// Bridge transaction queue.
    pub broadcaster: Broadcaster,
    /// Consensus node RPC client.
    pub consensus_rpc: Arc<TendermintRpcClient>,
    bridge_tx: mpsc::Sender<BridgeEvent>,
    bridge_rx: Mutex<Option<BridgeReceivers>>,
}

impl SubsystemContainer {
    /// Build every subsystem from `config`. Nothing is spawned yet.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let consensus_rpc = Arc::new(TendermintRpcClient::new(
            &config.consensus_rpc.host,
            config.consensus_rpc.port,
        )?);

        let broadcaster = Broadcaster::new();
        let (bridge_tx, bridge_rx) = mpsc::channel(config.bridge.event_buffer.max(1));
        let (rounds_tx, rounds_rx) = mpsc::unbounded_channel();
        let notifier = BridgeNotifier::new(bridge_tx.clone(), rounds_tx, broadcaster.clone());

        let app = OrderStreamApp::new(
            config.abci.app_config(),
            CommitState::new(),
            OrderTracker::new(config.abci.subscriber_capacity),
            notifier,
        );
        info!(
            "[os-01] ABCI application created (quota policy: {})",
            config.abci.quota_policy
        );

        Ok(Self {
            config,
            app: Arc::new(Mutex::new(app)),
            broadcaster,
            consensus_rpc,
            bridge_tx,
            bridge_rx: Mutex::new(Some((bridge_rx, rounds_rx))),
        })
    }

    /// Sender feeding the bridge event loop.
    pub fn bridge_sender(&self) -> mpsc::Sender<BridgeEvent> {
        self.bridge_tx.clone()
    }

    /// Receivers of the bridge event loop; `None` once taken.
    pub fn take_bridge_receivers(&self) -> Option<BridgeReceivers> {
        self.bridge_rx.lock().take()
    }

    /// Subscribe to orders delivered at each commit.
    pub fn subscribe_orders(&self) -> broadcast::Receiver<TaggedOrder> {
        self.app.lock().orders().subscribe()
    }

    /// Allow the order tracker to deliver to subscribers.
    pub fn activate_order_stream(&self) {
        self.app.lock().orders_mut().activate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use os_01_abci_app::{AbciApplication, BlockHeader};
    use shared_types::{codec, RebalanceProposal, Transaction};

    fn config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.bridge.enabled = false;
        config
    }

    #[test]
    fn test_container_builds_from_defaults() {
        let container = SubsystemContainer::new(config()).unwrap();
        assert_eq!(container.consensus_rpc.endpoint(), "http://localhost:26657");
        assert_eq!(container.broadcaster.pending(), 0);
        assert_eq!(container.app.lock().current_height(), 0);
    }

    #[test]
    fn test_bridge_receivers_taken_once() {
        let container = SubsystemContainer::new(config()).unwrap();
        assert!(container.take_bridge_receivers().is_some());
        assert!(container.take_bridge_receivers().is_none());
    }

    #[test]
    fn test_begin_block_reaches_bridge_channel() {
        let container = SubsystemContainer::new(config()).unwrap();
        let (mut rx, _rounds) = container.take_bridge_receivers().unwrap();

        container.app.lock().begin_block(&BlockHeader {
            height: 3,
            proposer: vec![0x01],
        });

        assert!(matches!(
            rx.try_recv(),
            Ok(BridgeEvent::OrderStreamBlock { height: 3, .. })
        ));
    }

    #[test]
    fn test_accepted_round_reaches_bridge_when_events_back_up() {
        let mut config = config();
        config.bridge.event_buffer = 1;
        let container = SubsystemContainer::new(config).unwrap();
        let (mut rx, mut rounds) = container.take_bridge_receivers().unwrap();

        {
            let mut app = container.app.lock();
            for height in 1..=3 {
                app.begin_block(&BlockHeader {
                    height,
                    proposer: vec![0x01],
                });
            }
            let proposal = RebalanceProposal {
                round: Round::next(0, 100, 20, 1_000),
                limits: Default::default(),
            };
            let tx = codec::encode(&Transaction::Rebalance(proposal)).unwrap();
            assert!(app.deliver_tx(&tx).is_accepted());
            app.commit();
        }

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(rounds.try_recv().map(|r| r.number), Ok(1));
    }

    #[test]
    fn test_empty_rpc_host_fails() {
        let mut config = config();
        config.consensus_rpc.host.clear();
        assert!(SubsystemContainer::new(config).is_err());
    }
}
