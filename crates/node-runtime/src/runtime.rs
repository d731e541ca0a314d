//! # Node Runtime
//!
//! Owns the subsystem container and every background task.
//!
//! ## Startup Sequence
//!
//! 1. Activate the order tracker
//! 2. Spawn the broadcast worker
//! 3. Create and start the stake rebalancer, spawn its event loop
//! 4. Bind and serve the HTTP ingress
//!
//! Every task watches the same shutdown channel.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use os_02_stake_rebalancer::{EthJsonRpcChain, StakeRebalancer, StakingChain};
use os_03_outbound_queue::ConsensusRpc;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::adapters::ingress_router;
use crate::container::{NodeConfig, SubsystemContainer};
use crate::errors::{NodeError, NodeResult};

/// Time given to tasks to finish after the shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The main node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    /// Subsystem container with all initialized services.
    container: Arc<SubsystemContainer>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    started: AtomicBool,
    api_addr: Mutex<Option<SocketAddr>>,
}

impl NodeRuntime {
    /// Create a new node runtime with configuration.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        info!("Creating OrderStream node runtime");
        let container = Arc::new(SubsystemContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            started: AtomicBool::new(false),
            api_addr: Mutex::new(None),
        })
    }

    /// Start against the configured external chain and consensus node.
    pub async fn start(&self) -> NodeResult<()> {
        let config = &self.container.config;
        let chain = if config.bridge.enabled {
            Some(EthJsonRpcChain::new(
                &config.bridge.provider_url,
                config.eth_rpc_config(),
            )?)
        } else {
            None
        };
        self.start_with(chain, Arc::clone(&self.container.consensus_rpc))
            .await
    }

    /// Start with explicit chain and consensus adapters.
    ///
    /// `chain` is ignored unless the bridge is enabled.
    pub async fn start_with<C, R>(&self, chain: Option<C>, rpc: Arc<R>) -> NodeResult<()>
    where
        C: StakingChain + 'static,
        R: ConsensusRpc + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(NodeError::AlreadyStarted);
        }
        let config = &self.container.config;

        info!("===========================================");
        info!("  OrderStream Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.container.activate_order_stream();

        let worker = self
            .container
            .broadcaster
            .worker(Arc::clone(&rpc), config.retry_interval());
        tokio::spawn(worker.run(self.shutdown_rx.clone()));

        let (bridge_rx, rounds_rx) = self
            .container
            .take_bridge_receivers()
            .ok_or(NodeError::AlreadyStarted)?;
        match chain.filter(|_| config.bridge.enabled) {
            Some(chain) => {
                let mut rebalancer = StakeRebalancer::create(
                    config.rebalancer_config(),
                    chain,
                    self.container.broadcaster.clone(),
                )
                .await?;
                rebalancer.start(self.container.bridge_sender()).await?;

                let shutdown = self.shutdown_rx.clone();
                tokio::spawn(async move {
                    rebalancer.run(bridge_rx, rounds_rx, shutdown).await;
                });
            }
            None => {
                info!("[os-02] Stake bridge disabled");
                drop(bridge_rx);
                drop(rounds_rx);
            }
        }

        if config.api.enabled {
            let listener = TcpListener::bind((config.api.host.as_str(), config.api.port)).await?;
            let addr = listener.local_addr()?;
            *self.api_addr.lock() = Some(addr);

            let router = ingress_router(rpc);
            let shutdown = self.shutdown_rx.clone();
            tokio::spawn(async move {
                let served = axum::serve(listener, router)
                    .with_graceful_shutdown(wait_for_shutdown(shutdown))
                    .await;
                if let Err(e) = served {
                    error!("[ingress] Server stopped: {}", e);
                }
            });
            info!("[ingress] Accepting orders on {}", addr);
        }

        info!(
            "Consensus RPC: {}",
            self.container.consensus_rpc.endpoint()
        );
        Ok(())
    }

    /// Shutdown the node gracefully.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        tokio::time::sleep(SHUTDOWN_GRACE).await;

        info!("Shutdown complete");
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }

    /// Address the ingress is bound to, once started.
    pub fn api_addr(&self) -> Option<SocketAddr> {
        *self.api_addr.lock()
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
