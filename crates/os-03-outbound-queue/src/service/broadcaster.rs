//! # Transaction Broadcaster
//!
//! Outbound queue for transactions the bridge submits to consensus. The
//! consensus side only enqueues and triggers; a worker task owns the network
//! round trips.
//!
//! ```text
//! add(tx) ──→ [queue] ──trigger()──→ BroadcastWorker ──→ broadcast_tx_sync
//!                 ↑                        │
//!                 └──── kept on failure ───┘
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{error, info, warn};

use crate::domain::{OutboundQueue, OutboundResult};
use crate::ports::ConsensusRpc;

/// Default delay before retrying a failed drain.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Cloneable handle for queueing encoded transactions.
#[derive(Clone, Default)]
pub struct Broadcaster {
    queue: Arc<Mutex<OutboundQueue<Vec<u8>>>>,
    notify: Arc<Notify>,
}

impl Broadcaster {
    /// New empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an encoded transaction.
    pub fn add(&self, tx: Vec<u8>) {
        self.queue.lock().add(tx);
    }

    /// Wake the worker to drain the queue.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Transactions not yet accepted by the consensus node.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Worker draining this broadcaster through `rpc`.
    pub fn worker<R: ConsensusRpc>(&self, rpc: R, retry_interval: Duration) -> BroadcastWorker<R> {
        BroadcastWorker {
            queue: Arc::clone(&self.queue),
            notify: Arc::clone(&self.notify),
            rpc,
            retry_interval,
        }
    }
}

/// Background task submitting queued transactions.
pub struct BroadcastWorker<R> {
    queue: Arc<Mutex<OutboundQueue<Vec<u8>>>>,
    notify: Arc<Notify>,
    rpc: R,
    retry_interval: Duration,
}

impl<R: ConsensusRpc> BroadcastWorker<R> {
    /// Submit queued transactions in order until empty or a call fails.
    ///
    /// A transaction the application rejects in `CheckTx` counts as
    /// delivered; resubmitting it would be rejected again.
    pub async fn drain(&self) -> OutboundResult<usize> {
        let mut delivered = 0;
        loop {
            let next = self.queue.lock().peek().cloned();
            let Some(tx) = next else {
                return Ok(delivered);
            };

            let result = self.rpc.broadcast_tx_sync(&tx).await?;
            if !result.is_accepted() {
                warn!(
                    "[os-03] Consensus rejected transaction (code {}): {}",
                    result.code, result.log
                );
            }
            // Only this worker removes items, so the head is still `tx`
            self.queue.lock().ack();
            delivered += 1;
        }
    }

    /// Drain on every trigger until shutdown.
    ///
    /// While transactions remain queued after a failure, the drain is retried
    /// every `retry_interval` without waiting for a new trigger.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("[os-03] Broadcast worker started");
        loop {
            let pending = !self.queue.lock().is_empty();
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(self.retry_interval), if pending => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.drain().await {
                Ok(0) => {}
                Ok(n) => info!("[os-03] Broadcast {} transactions", n),
                Err(e) if e.is_transient() => {
                    warn!("[os-03] Broadcast failed, will retry: {}", e)
                }
                Err(e) => error!("[os-03] Broadcast failed: {}", e),
            }
        }
        info!("[os-03] Broadcast worker stopped");
    }
}
