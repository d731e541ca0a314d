//! [`TxSubmitter`] backed by the outbound queue's transaction broadcaster.

use os_03_outbound_queue::Broadcaster;
use shared_types::{codec, Transaction};
use tracing::debug;

use crate::domain::{RebalancerError, RebalancerResult};
use crate::ports::TxSubmitter;

impl TxSubmitter for Broadcaster {
    fn submit(&self, tx: &Transaction) -> RebalancerResult<()> {
        let bytes = codec::encode(tx).map_err(|e| RebalancerError::TxFailed(e.to_string()))?;
        debug!(
            "[os-02] Queued {} transaction ({} bytes)",
            tx.kind(),
            bytes.len()
        );
        self.add(bytes);
        Ok(())
    }
}
