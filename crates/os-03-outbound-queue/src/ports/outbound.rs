//! Driven ports: the consensus node the broadcaster submits to.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::{OutboundError, OutboundResult};

/// `broadcast_tx_sync` outcome as reported by the consensus node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// `CheckTx` response code; zero means accepted into the mempool.
    #[serde(default)]
    pub code: u32,
    /// Application data returned by `CheckTx`.
    #[serde(default)]
    pub data: String,
    /// Application log returned by `CheckTx`.
    #[serde(default)]
    pub log: String,
    /// Transaction hash.
    #[serde(default)]
    pub hash: String,
}

impl BroadcastResult {
    /// Whether the application accepted the transaction.
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

/// Consensus node transaction submission.
#[async_trait]
pub trait ConsensusRpc: Send + Sync {
    /// Submit raw transaction bytes and wait for `CheckTx`.
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> OutboundResult<BroadcastResult>;
}

#[async_trait]
impl<R: ConsensusRpc + ?Sized> ConsensusRpc for Arc<R> {
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> OutboundResult<BroadcastResult> {
        (**self).broadcast_tx_sync(tx).await
    }
}

/// In-memory consensus node for tests.
///
/// Records every submission and can be told to fail the next `n` calls.
#[derive(Default)]
pub struct MockConsensusRpc {
    submitted: Mutex<Vec<Vec<u8>>>,
    failures: AtomicUsize,
    reject_code: Mutex<Option<u32>>,
}

impl MockConsensusRpc {
    /// Fresh mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` submissions with a connection error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Answer every submission with a non-zero `CheckTx` code.
    pub fn reject_with(&self, code: u32) {
        *self.reject_code.lock() = Some(code);
    }

    /// Transactions accepted so far.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl ConsensusRpc for MockConsensusRpc {
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> OutboundResult<BroadcastResult> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(OutboundError::Connection("mock node offline".to_string()));
        }

        self.submitted.lock().push(tx.to_vec());
        let code = (*self.reject_code.lock()).unwrap_or(0);
        Ok(BroadcastResult {
            code,
            ..Default::default()
        })
    }
}
