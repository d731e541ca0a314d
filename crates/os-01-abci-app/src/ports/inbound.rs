//! Driving port: the callbacks a consensus engine invokes.

use shared_types::Hash;

use crate::domain::Verdict;

/// Block header fields the application uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
    /// Raw proposer address.
    pub proposer: Vec<u8>,
}

/// Response to `info`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoResponse {
    /// Application name.
    pub data: String,
    /// Application version.
    pub version: String,
    /// Height of the last committed block.
    pub last_block_height: u64,
    /// App hash of the last committed block; empty before the first commit.
    pub last_block_app_hash: Vec<u8>,
}

/// ABCI application callbacks.
///
/// Calls arrive sequentially: `begin_block`, any number of `deliver_tx`,
/// then `commit`. `check_tx` may interleave and never changes state.
pub trait AbciApplication: Send {
    /// Application metadata and last committed height/hash.
    fn info(&self) -> InfoResponse;

    /// Start of a block.
    fn begin_block(&mut self, header: &BlockHeader);

    /// Mempool admission.
    fn check_tx(&self, tx: &[u8]) -> Verdict;

    /// Execute a transaction of the current block.
    fn deliver_tx(&mut self, tx: &[u8]) -> Verdict;

    /// Finish the block and return the app hash.
    fn commit(&mut self) -> Hash;
}
