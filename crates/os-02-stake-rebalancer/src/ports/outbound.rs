//! Driven ports: the external chain and the consensus submission path.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, Transaction};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::inbound::BridgeEvent;
use crate::domain::{RebalancerError, RebalancerResult};

/// External chain hosting the staking contract.
#[async_trait]
pub trait StakingChain: Send + Sync {
    /// Current head height.
    async fn block_number(&self) -> RebalancerResult<u64>;

    /// Check that a contract is deployed at `contract`.
    async fn bind_contract(&self, contract: Address) -> RebalancerResult<()>;

    /// Stream stake logs from `from_block` onward, then new heads, into
    /// `sink`. Stops once `sink` is closed.
    async fn subscribe(
        &self,
        contract: Address,
        from_block: u64,
        sink: mpsc::Sender<BridgeEvent>,
    ) -> RebalancerResult<()>;
}

#[async_trait]
impl<C: StakingChain + ?Sized> StakingChain for Arc<C> {
    async fn block_number(&self) -> RebalancerResult<u64> {
        (**self).block_number().await
    }

    async fn bind_contract(&self, contract: Address) -> RebalancerResult<()> {
        (**self).bind_contract(contract).await
    }

    async fn subscribe(
        &self,
        contract: Address,
        from_block: u64,
        sink: mpsc::Sender<BridgeEvent>,
    ) -> RebalancerResult<()> {
        (**self).subscribe(contract, from_block, sink).await
    }
}

/// Queues bridge transactions for consensus. Must not block.
pub trait TxSubmitter: Send + Sync {
    /// Queue `tx` for broadcast.
    fn submit(&self, tx: &Transaction) -> RebalancerResult<()>;
}

impl<S: TxSubmitter + ?Sized> TxSubmitter for Arc<S> {
    fn submit(&self, tx: &Transaction) -> RebalancerResult<()> {
        (**self).submit(tx)
    }
}

// =============================================================================
// Mock implementations for testing
// =============================================================================

/// In-memory staking chain.
#[derive(Default)]
pub struct MockStakingChain {
    height: AtomicU64,
    unreachable: AtomicBool,
    missing_contract: AtomicBool,
    fail_subscribe: AtomicBool,
    sink: Mutex<Option<mpsc::Sender<BridgeEvent>>>,
}

impl MockStakingChain {
    /// Chain at `height`.
    pub fn new(height: u64) -> Self {
        let chain = Self::default();
        chain.height.store(height, Ordering::SeqCst);
        chain
    }

    /// Make `block_number` fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make `bind_contract` fail.
    pub fn set_missing_contract(&self, missing: bool) {
        self.missing_contract.store(missing, Ordering::SeqCst);
    }

    /// Make `subscribe` fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Sink handed to `subscribe`, to inject events.
    pub fn sink(&self) -> Option<mpsc::Sender<BridgeEvent>> {
        self.sink.lock().clone()
    }
}

#[async_trait]
impl StakingChain for MockStakingChain {
    async fn block_number(&self) -> RebalancerResult<u64> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RebalancerError::ChainUnreachable("mock offline".to_string()));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn bind_contract(&self, contract: Address) -> RebalancerResult<()> {
        if self.missing_contract.load(Ordering::SeqCst) {
            return Err(RebalancerError::ContractBinding(format!(
                "no code at {}",
                contract
            )));
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        _contract: Address,
        _from_block: u64,
        sink: mpsc::Sender<BridgeEvent>,
    ) -> RebalancerResult<()> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(RebalancerError::Subscription("mock refused".to_string()));
        }
        *self.sink.lock() = Some(sink);
        Ok(())
    }
}

/// Submitter that records transactions.
#[derive(Default)]
pub struct RecordingSubmitter {
    txs: Mutex<Vec<Transaction>>,
    failing: AtomicBool,
}

impl RecordingSubmitter {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `submit` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Submitted transactions.
    pub fn submitted(&self) -> Vec<Transaction> {
        self.txs.lock().clone()
    }

    /// Forget recorded transactions.
    pub fn clear(&self) {
        self.txs.lock().clear();
    }
}

impl TxSubmitter for RecordingSubmitter {
    fn submit(&self, tx: &Transaction) -> RebalancerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RebalancerError::TxFailed("recorder failing".to_string()));
        }
        self.txs.lock().push(tx.clone());
        Ok(())
    }
}
